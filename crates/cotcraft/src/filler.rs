//! Default substructure synthesized when decoding reaches a missing detail node.

use crate::{
    compiled::AttrPath,
    cursor::Cursor,
    errors::DecodeError,
    event::{format_time, Event, Node, NodePath},
    tree,
};

/// Chat room every synthesized remark is addressed to.
pub const ALL_CHAT_ROOMS: &str = "All Chat Rooms";

/// Builds the node a decode path needs when the event lacks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filler {
    /// Chat remarks plus the link and server destination a chat message carries.
    Remarks,
    Uid,
    /// Contact reachable over the streaming endpoint.
    Contact,
    /// An empty node of the requested name.
    Default,
}

impl Filler {
    pub fn for_node(name: &str) -> Self {
        match name {
            "remarks" => Filler::Remarks,
            "uid" => Filler::Uid,
            "contact" => Filler::Contact,
            _ => Filler::Default,
        }
    }

    /// Adds the node `name` (and any companions) under `parent`.
    pub(crate) fn fill(
        &self,
        event: &mut Event,
        parent: &NodePath,
        name: &str,
        message_type: &str,
    ) -> Result<(), DecodeError> {
        let children = match self {
            Filler::Remarks => {
                let callsign = sender_callsign(event)?;
                vec![
                    Node::new("link")
                        .with_attr("uid", callsign.as_str())
                        .with_attr("relation", "p-p")
                        .with_attr("type", message_type),
                    Node::new("__serverdestination")
                        .with_attr("destinations", format!("0.0.0.0:4242:tcp:{callsign}")),
                    Node::new("remarks")
                        .with_attr("time", format_time(std::time::SystemTime::now()))
                        .with_attr("source", format!("BAO.F.SAE.{callsign}"))
                        .with_attr("to", ALL_CHAT_ROOMS),
                ]
            }
            Filler::Uid => vec![Node::new("uid")],
            Filler::Contact => vec![Node::new("contact").with_attr("endpoint", "*:-1:stcp")],
            Filler::Default => vec![Node::new(name)],
        };

        let node = event
            .node_mut(parent)
            .ok_or_else(|| DecodeError::MissingNode(name.to_string()))?;
        node.children.extend(children);

        Ok(())
    }
}

/// Callsign of the chat sender, falling back to the contact callsign.
pub(crate) fn sender_callsign(event: &Event) -> Result<String, DecodeError> {
    let single = Cursor::single();
    let chat = AttrPath {
        nodes: vec!["__chat".to_string()],
        attr: "senderCallsign".to_string(),
    };
    let contact = AttrPath {
        nodes: vec!["contact".to_string()],
        attr: "callsign".to_string(),
    };

    if let Some(callsign) = tree::read_attr(event, &chat, &single).filter(|c| !c.is_empty()) {
        return Ok(callsign);
    }
    tree::read_attr(event, &contact, &single)
        .ok_or_else(|| DecodeError::MissingAttribute(contact.to_string()))
}
