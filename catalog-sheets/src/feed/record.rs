//! Flattened catalog record

/// One catalog entry: ordered field name → text value pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field. A repeated name replaces the earlier value but keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Drop the field names, keeping values in field order
    pub fn into_values(self) -> Vec<String> {
        self.fields.into_iter().map(|(_, value)| value).collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_order_is_insertion_order() {
        let record: Record = [("sku", "A-1"), ("name", "Espresso"), ("price", "2.50")]
            .into_iter()
            .collect();

        assert_eq!(record.field_names(), vec!["sku", "name", "price"]);
        assert_eq!(record.into_values(), vec!["A-1", "Espresso", "2.50"]);
    }

    #[test]
    fn test_repeated_field_overwrites_in_place() {
        let mut record = Record::new();
        record.insert("name", "first");
        record.insert("price", "1");
        record.insert("name", "second");

        assert_eq!(record.get("name"), Some("second"));
        assert_eq!(record.field_names(), vec!["name", "price"]);
        assert_eq!(record.into_values(), vec!["second", "1"]);
    }
}
