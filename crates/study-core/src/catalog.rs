//! Opinion questionnaire catalog
//!
//! An ordered list of `(id, statement)` items. The flow engine only needs the
//! ids; the statements are for the front-end.

use crate::error::CatalogError;
use crate::types::Question;
use std::collections::HashSet;
use std::path::Path;

const BUILTIN: &[(u32, &str)] = &[
    (1, "Ochrona środowiska powinna mieć pierwszeństwo przed wzrostem gospodarczym."),
    (2, "Polska powinna przyjmować więcej uchodźców."),
    (3, "Energia jądrowa jest bezpiecznym źródłem energii."),
    (4, "Szczepienia ochronne powinny być obowiązkowe."),
    (5, "Sztuczna inteligencja przyniesie społeczeństwu więcej korzyści niż szkód."),
    (6, "Praca zdalna jest równie efektywna jak praca w biurze."),
    (7, "Transport publiczny w miastach powinien być bezpłatny."),
    (8, "Media społecznościowe szkodzą zdrowiu psychicznemu młodzieży."),
];

/// Ordered questionnaire catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
}

impl QuestionCatalog {
    /// Build catalog, rejecting empty lists and duplicate ids
    pub fn new(questions: Vec<Question>) -> Result<Self, CatalogError> {
        if questions.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::with_capacity(questions.len());
        for q in &questions {
            if !seen.insert(q.id) {
                return Err(CatalogError::DuplicateId(q.id));
            }
        }
        Ok(Self { questions })
    }

    /// Catalog shipped with the study
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            questions: BUILTIN
                .iter()
                .map(|&(id, statement)| Question {
                    id,
                    statement: statement.to_string(),
                })
                .collect(),
        }
    }

    /// Parse a JSON array of `{ "id": .., "statement": .. }` objects
    pub fn from_json_str(text: &str) -> Result<Self, CatalogError> {
        Self::new(serde_json::from_str(text)?)
    }

    /// Load a JSON catalog file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json_str(&text)?;
        tracing::debug!("Loaded {} questions from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Load the file if given, otherwise the built-in catalog
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, CatalogError> {
        path.map_or_else(|| Ok(Self::builtin()), Self::load)
    }

    /// Questions in presentation order
    #[inline]
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Question ids in presentation order
    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.questions.iter().map(|q| q.id)
    }

    /// Look up a question by id
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Number of questions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false for a constructed catalog
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

impl Default for QuestionCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_ids_are_unique() {
        let catalog = QuestionCatalog::builtin();
        let ids: HashSet<u32> = catalog.ids().collect();
        assert_eq!(ids.len(), catalog.len());
        assert!(!catalog.is_empty());
    }

    #[test]
    fn parses_json_catalog() {
        let catalog = QuestionCatalog::from_json_str(
            r#"[{"id": 3, "statement": "A"}, {"id": 9, "statement": "B"}]"#,
        )
        .unwrap();
        assert_eq!(catalog.ids().collect::<Vec<_>>(), vec![3, 9]);
        assert_eq!(catalog.get(9).unwrap().statement, "B");
        assert!(catalog.get(4).is_none());
    }

    #[test]
    fn rejects_duplicates_and_empty() {
        assert!(matches!(
            QuestionCatalog::from_json_str(r#"[{"id": 1, "statement": "A"}, {"id": 1, "statement": "B"}]"#),
            Err(CatalogError::DuplicateId(1))
        ));
        assert!(matches!(
            QuestionCatalog::from_json_str("[]"),
            Err(CatalogError::Empty)
        ));
        assert!(matches!(
            QuestionCatalog::from_json_str("{}"),
            Err(CatalogError::Parse(_))
        ));
    }
}
