use serde::{Deserialize, Serialize};

// ── Typed ID wrappers ──────────────────────────────────────────────

macro_rules! typed_id {
    ($name:ident, $inner:ty) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub $inner);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(id: $inner) -> Self {
                Self(id)
            }
        }
    };
}

typed_id!(DocId, i64);
typed_id!(SiteIdx, usize);

impl SiteIdx {
    /// Position of the site inside its graph's arena.
    pub fn index(self) -> usize {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_id_displays_raw_value() {
        assert_eq!(DocId(42).to_string(), "42");
        assert_eq!(DocId::from(-7).to_string(), "-7");
    }

    #[test]
    fn site_idx_is_transparent_in_json() {
        let json = serde_json::to_string(&SiteIdx(3)).unwrap();
        assert_eq!(json, "3");
        let back: SiteIdx = serde_json::from_str(&json).unwrap();
        assert_eq!(back.index(), 3);
    }
}
