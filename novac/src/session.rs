use std::collections::BTreeSet;

/// State one compiler instance carries from one compilation to the next.
///
/// Names minted by the compressor are remembered so that recompiling an
/// edited source keeps treating them as generated symbols.
#[derive(Debug, Clone, Default)]
pub struct Session {
    minted: BTreeSet<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.minted.extend(names.into_iter().map(Into::into));
    }

    pub fn is_minted(&self, name: &str) -> bool {
        self.minted.contains(name)
    }

    pub fn minted(&self) -> impl Iterator<Item = &str> {
        self.minted.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.minted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.minted.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_names_without_duplicates() {
        let mut session = Session::new();
        assert!(session.is_empty());
        session.record(["_lessthan_0", "_ternary_0"]);
        session.record(vec!["_lessthan_0".to_string()]);
        assert_eq!(session.len(), 2);
        assert!(session.is_minted("_ternary_0"));
        assert!(!session.is_minted("x"));
        assert_eq!(session.minted().collect::<Vec<_>>(), ["_lessthan_0", "_ternary_0"]);
    }
}
