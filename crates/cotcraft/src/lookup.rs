//! Bidirectional id ↔ key tables used to carry icons as small integers.
//!
//! A table is an array indexed by id plus a side map for reverse lookup by key.
//! Ids are implied by insertion order and must run 0, 1, 2, ...

use std::collections::HashMap;

use crate::errors::TableError;

/// An entry that can be indexed by a string key.
pub trait Keyed {
    /// Key used for reverse lookup.
    fn key(&self) -> String;
}

/// A row of the icon path table: an icon set group.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct IconPath {
    pub category: String,
    pub group: String,
    pub uuid: String,
}

impl Keyed for IconPath {
    fn key(&self) -> String {
        format!("{}/{}", self.uuid, self.group)
    }
}

/// A row of the icon file table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct IconFile {
    pub name: String,
}

impl Keyed for IconFile {
    fn key(&self) -> String {
        self.name.clone()
    }
}

/// A row of the type → icon table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TypeIcon {
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub event_type: String,
    pub name: String,
}

impl Keyed for TypeIcon {
    fn key(&self) -> String {
        self.event_type.clone()
    }
}

/// Array of entries indexed by sequential id, with a reverse index by key.
#[derive(Debug, Clone)]
pub struct LookupTable<T> {
    entries: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for LookupTable<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Keyed> LookupTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `entry` under `id`. Fails unless `id` is the next id in sequence.
    pub fn insert(&mut self, id: usize, entry: T) -> Result<(), TableError> {
        if id != self.entries.len() {
            return Err(TableError::OutOfSequence {
                expected: self.entries.len(),
                actual: id,
            });
        }

        self.index.insert(entry.key(), id);
        self.entries.push(entry);
        Ok(())
    }

    /// Key of the entry with the given id.
    pub fn key(&self, id: usize) -> Option<String> {
        self.entries.get(id).map(Keyed::key)
    }

    /// Id of the entry with the given key.
    pub fn id(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn get(&self, id: usize) -> Option<&T> {
        self.entries.get(id)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The three icon tables consulted by icon converters and type predicates.
#[derive(Debug, Clone, Default)]
pub struct LookupTables {
    pub icon_paths: LookupTable<IconPath>,
    pub icon_files: LookupTable<IconFile>,
    pub type_icons: LookupTable<TypeIcon>,
}

impl LookupTables {
    /// Builds the tables from CSV-style rows: `[category, group, uuid]`, `[name]`
    /// and `[type, name]`.
    pub fn from_rows<S: AsRef<str>>(
        icon_paths: &[Vec<S>],
        icon_files: &[Vec<S>],
        type_icons: &[Vec<S>],
    ) -> Result<Self, TableError> {
        let mut tables = LookupTables::default();

        for (id, row) in icon_paths.iter().enumerate() {
            let [category, group, uuid] = columns::<3, S>(row, id)?;
            tables.icon_paths.insert(
                id,
                IconPath {
                    category,
                    group,
                    uuid,
                },
            )?;
        }

        for (id, row) in icon_files.iter().enumerate() {
            let [name] = columns::<1, S>(row, id)?;
            tables.icon_files.insert(id, IconFile { name })?;
        }

        for (id, row) in type_icons.iter().enumerate() {
            let [event_type, name] = columns::<2, S>(row, id)?;
            tables.type_icons.insert(id, TypeIcon { event_type, name })?;
        }

        Ok(tables)
    }
}

fn columns<const N: usize, S: AsRef<str>>(row: &[S], id: usize) -> Result<[String; N], TableError> {
    if row.len() < N {
        return Err(TableError::MalformedRow {
            row: id,
            columns: row.len(),
            expected: N,
        });
    }

    Ok(std::array::from_fn(|i| row[i].as_ref().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> IconFile {
        IconFile {
            name: name.to_string(),
        }
    }

    #[test]
    fn test_insert_in_sequence() {
        let mut table = LookupTable::new();
        table.insert(0, file("a.png")).unwrap();
        table.insert(1, file("b.png")).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.key(1), Some("b.png".to_string()));
        assert_eq!(table.id("a.png"), Some(0));
        assert_eq!(table.key(2), None);
        assert_eq!(table.id("c.png"), None);
    }

    #[test]
    fn test_insert_out_of_sequence_fails() {
        let mut table = LookupTable::new();
        table.insert(0, file("a.png")).unwrap();

        assert_eq!(
            table.insert(2, file("c.png")).unwrap_err(),
            TableError::OutOfSequence {
                expected: 1,
                actual: 2
            }
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_first_id_must_be_zero() {
        let mut table = LookupTable::new();
        assert!(table.insert(1, file("a.png")).is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn test_icon_path_key() {
        let path = IconPath {
            category: "Google".to_string(),
            group: "Google".to_string(),
            uuid: "f7f71666-8b28-4b57-9fbb-e38e61d33b79".to_string(),
        };
        assert_eq!(path.key(), "f7f71666-8b28-4b57-9fbb-e38e61d33b79/Google");
    }

    #[test]
    fn test_from_rows() {
        let tables = LookupTables::from_rows(
            &[vec!["Military", "Friendly", "6d781afb"]],
            &[vec!["plane.png"], vec!["tank.png"]],
            &[vec!["a-f-G", "tank.png"]],
        )
        .unwrap();

        assert_eq!(tables.icon_paths.id("6d781afb/Friendly"), Some(0));
        assert_eq!(tables.icon_files.key(1), Some("tank.png".to_string()));
        assert_eq!(tables.type_icons.get(0).unwrap().name, "tank.png");
    }

    #[test]
    fn test_from_rows_rejects_short_row() {
        let err = LookupTables::from_rows(&[vec!["Military"]], &[], &[]).unwrap_err();
        assert_eq!(
            err,
            TableError::MalformedRow {
                row: 0,
                columns: 1,
                expected: 3
            }
        );
    }
}
