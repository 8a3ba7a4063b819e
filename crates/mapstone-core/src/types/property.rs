use std::fmt;

///
/// PropertyPath
///
/// Dotted, optionally indexed property navigation (`orders[0].item.sku`),
/// parsed once and walked segment by segment during type inference.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PropertyPath {
    segments: Vec<PropertySegment>,
}

///
/// PropertySegment
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PropertySegment {
    pub name: String,
    pub index: Option<String>,
}

impl PropertyPath {
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let segments = path
            .split('.')
            .map(|raw| {
                // a trailing "[idx]" belongs to the segment, not the name
                raw.find('[').map_or_else(
                    || PropertySegment {
                        name: raw.to_string(),
                        index: None,
                    },
                    |open| PropertySegment {
                        name: raw[..open].to_string(),
                        index: Some(raw[open + 1..].trim_end_matches(']').to_string()),
                    },
                )
            })
            .collect();

        Self { segments }
    }

    #[must_use]
    pub fn segments(&self) -> &[PropertySegment] {
        &self.segments
    }

    /// The leading segment name of a nested path.
    #[must_use]
    pub fn head(&self) -> &str {
        &self.segments[0].name
    }

    #[must_use]
    pub fn is_simple(&self) -> bool {
        self.segments.len() == 1 && self.segments[0].index.is_none()
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", segment.name)?;
            if let Some(index) = &segment.index {
                write!(f, "[{index}]")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_dotted_paths_into_segments() {
        let path = PropertyPath::parse("student.address.city");
        assert_eq!(path.segments().len(), 3);
        assert_eq!(path.head(), "student");
        assert!(!path.is_simple());
    }

    #[test]
    fn extracts_collection_indexes() {
        let path = PropertyPath::parse("orders[0].sku");
        assert_eq!(path.segments()[0].name, "orders");
        assert_eq!(path.segments()[0].index.as_deref(), Some("0"));
        assert_eq!(path.segments()[1].name, "sku");
    }

    #[test]
    fn round_trips_through_display() {
        for text in ["id", "orders[0].sku", "a.b.c"] {
            assert_eq!(PropertyPath::parse(text).to_string(), text);
        }
    }
}
