//! The CoT event model the transcoder reads from and writes into.
//!
//! An [Event] carries a few top-level primitives, a typed [Point] and an
//! optional `detail` tree of [Node]s. Nodes inside the detail tree are
//! addressed by [NodePath], a list of child indices starting at `detail`.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Default `how` of events produced by decoding.
pub const DEFAULT_HOW: &str = "h-g-i-g-o";

/// CoT value for an unknown circular / linear error.
pub const UNKNOWN_ERROR: f64 = 9_999_999.0;

/// One node of the detail tree.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Node {
    pub name: String,
    /// Attributes in insertion order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub attrs: Vec<(String, String)>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub content: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets `key`, replacing an existing value in place.
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((key.to_string(), value)),
        }
    }

    /// Appends a child and returns its index.
    pub fn add_child(&mut self, child: Node) -> usize {
        self.children.push(child);
        self.children.len() - 1
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.children.iter().any(|c| c.name == name)
    }

    pub fn first_child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn count_children(&self, name: &str) -> usize {
        self.children_named(name).count()
    }

    /// Index into `children` of the `n`-th child called `name`.
    pub fn nth_child_index(&self, name: &str, n: usize) -> Option<usize> {
        self.children
            .iter()
            .enumerate()
            .filter(|(_, c)| c.name == name)
            .nth(n)
            .map(|(i, _)| i)
    }

    /// Indices into `children` of every child called `name`.
    pub fn child_indices(&self, name: &str) -> Vec<usize> {
        self.children
            .iter()
            .enumerate()
            .filter(|(_, c)| c.name == name)
            .map(|(i, _)| i)
            .collect()
    }

    fn descend(&self, path: &[usize]) -> Option<&Node> {
        path.iter().try_fold(self, |node, &i| node.children.get(i))
    }

    fn descend_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        path.iter()
            .try_fold(self, |node, &i| node.children.get_mut(i))
    }
}

/// Location of a node as child indices below `detail`. The empty path is `detail` itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child(&self, index: usize) -> Self {
        let mut path = self.0.clone();
        path.push(index);
        Self(path)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

/// Top-level string primitives a field may bind to with a leading-dot name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Uid,
    Type,
    How,
}

impl Primitive {
    /// Resolves `.uid`, `.type` or `.how` (case-insensitive, dot optional).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "uid" => Some(Primitive::Uid),
            "type" => Some(Primitive::Type),
            "how" => Some(Primitive::How),
            _ => None,
        }
    }
}

/// Position attributes a field may bind to, selected by the name suffix (`point.lat`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointAxis {
    Lat,
    Lon,
    Hae,
    Ce,
    Le,
}

impl PointAxis {
    /// Resolves the part after the last `.` of a field name.
    pub fn from_name(name: &str) -> Option<Self> {
        let suffix = name.rsplit('.').next()?;
        match suffix.to_ascii_lowercase().as_str() {
            "lat" => Some(PointAxis::Lat),
            "lon" => Some(PointAxis::Lon),
            "hae" => Some(PointAxis::Hae),
            "ce" => Some(PointAxis::Ce),
            "le" => Some(PointAxis::Le),
            _ => None,
        }
    }
}

/// Event position.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
    pub hae: f64,
    pub ce: f64,
    pub le: f64,
}

impl Default for Point {
    fn default() -> Self {
        Self {
            lat: 0.0,
            lon: 0.0,
            hae: 0.0,
            ce: UNKNOWN_ERROR,
            le: UNKNOWN_ERROR,
        }
    }
}

impl Point {
    pub fn get(&self, axis: PointAxis) -> f64 {
        match axis {
            PointAxis::Lat => self.lat,
            PointAxis::Lon => self.lon,
            PointAxis::Hae => self.hae,
            PointAxis::Ce => self.ce,
            PointAxis::Le => self.le,
        }
    }

    pub fn set(&mut self, axis: PointAxis, value: f64) {
        match axis {
            PointAxis::Lat => self.lat = value,
            PointAxis::Lon => self.lon = value,
            PointAxis::Hae => self.hae = value,
            PointAxis::Ce => self.ce = value,
            PointAxis::Le => self.le = value,
        }
    }
}

/// A situational-awareness event.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Event {
    pub uid: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub event_type: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub how: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub time: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub start: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub stale: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub point: Point,
    #[cfg_attr(feature = "serde", serde(default))]
    pub detail: Option<Node>,
}

impl Event {
    pub fn new(event_type: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            event_type: event_type.into(),
            ..Default::default()
        }
    }

    /// An empty event stamped now and stale after `stale_after`, used as the decode seed.
    pub fn basic(stale_after: Duration) -> Self {
        let now = SystemTime::now();
        let time = format_time(now);
        Self {
            how: DEFAULT_HOW.to_string(),
            start: time.clone(),
            stale: format_time(now + stale_after),
            time,
            detail: Some(Node::new("detail")),
            ..Default::default()
        }
    }

    pub fn primitive(&self, primitive: Primitive) -> &str {
        match primitive {
            Primitive::Uid => &self.uid,
            Primitive::Type => &self.event_type,
            Primitive::How => &self.how,
        }
    }

    pub fn set_primitive(&mut self, primitive: Primitive, value: String) {
        match primitive {
            Primitive::Uid => self.uid = value,
            Primitive::Type => self.event_type = value,
            Primitive::How => self.how = value,
        }
    }

    pub fn node(&self, path: &NodePath) -> Option<&Node> {
        self.detail.as_ref()?.descend(path.indices())
    }

    pub fn node_mut(&mut self, path: &NodePath) -> Option<&mut Node> {
        self.detail.as_mut()?.descend_mut(path.indices())
    }
}

/// Formats `time` as a CoT timestamp (`2006-01-02T15:04:05.000Z`, UTC).
pub fn format_time(time: SystemTime) -> String {
    let since_epoch = time.duration_since(UNIX_EPOCH).unwrap_or_default();
    let secs = since_epoch.as_secs();
    let millis = since_epoch.subsec_millis();

    let days = (secs / 86_400) as i64;
    let rem = secs % 86_400;
    let (year, month, day) = civil_from_days(days);

    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{millis:03}Z",
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60
    )
}

// Days since 1970-01-01 to a proleptic Gregorian date.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };

    (year, month, day)
}
