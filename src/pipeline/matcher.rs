use crate::config::{FilterConfig, MatchMode};

/// Case-insensitive substring keyword filter.
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    mode: MatchMode,
    include: Vec<String>,
    exclude: Vec<String>,
    job: Vec<String>,
}

impl KeywordFilter {
    pub fn new(
        mode: MatchMode,
        include: impl IntoIterator<Item = impl AsRef<str>>,
        exclude: impl IntoIterator<Item = impl AsRef<str>>,
        job: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Self {
        Self {
            mode,
            include: lowercase_all(include),
            exclude: lowercase_all(exclude),
            job: lowercase_all(job),
        }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(config.mode, &config.include, &config.exclude, &config.job)
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn include(&self) -> &[String] {
        &self.include
    }

    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }

    pub fn job(&self) -> &[String] {
        &self.job
    }

    pub fn matches(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let lowered = text.to_lowercase();

        // An empty job list leaves the gate open.
        if self.mode == MatchMode::Strict
            && !self.job.is_empty()
            && !contains_any(&lowered, &self.job)
        {
            return false;
        }

        contains_any(&lowered, &self.include) && !contains_any(&lowered, &self.exclude)
    }
}

fn contains_any(haystack: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|kw| haystack.contains(kw.as_str()))
}

fn lowercase_all(keywords: impl IntoIterator<Item = impl AsRef<str>>) -> Vec<String> {
    keywords
        .into_iter()
        .map(|kw| kw.as_ref().trim().to_lowercase())
        .filter(|kw| !kw.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict(include: &[&str], exclude: &[&str], job: &[&str]) -> KeywordFilter {
        KeywordFilter::new(MatchMode::Strict, include, exclude, job)
    }

    fn simple(include: &[&str], exclude: &[&str]) -> KeywordFilter {
        KeywordFilter::new(MatchMode::Simple, include, exclude, ["vaga"])
    }

    #[test]
    fn strict_requires_job_include_and_no_exclude() {
        let filter = strict(&["python"], &["estágio"], &["vaga"]);
        assert!(filter.matches("Vaga de Python Developer"));
        assert!(!filter.matches("Python meetup"));
        assert!(!filter.matches("Vaga de Estágio em Python"));
        assert!(!filter.matches("Vaga de Java Developer"));
    }

    #[test]
    fn strict_with_empty_job_list_skips_the_gate() {
        let filter = strict(&["python"], &["estágio"], &[]);
        assert!(filter.matches("Python meetup"));
        assert!(!filter.matches("Estágio Python"));
        assert!(!filter.matches("Rust meetup"));
    }

    #[test]
    fn simple_mode_ignores_job_keywords() {
        let filter = simple(&["python"], &["estágio"]);
        assert!(filter.matches("Python meetup"));
        assert!(!filter.matches("Vaga estágio python"));
    }

    #[test]
    fn empty_include_list_never_matches() {
        let filter = simple(&[], &[]);
        for text in ["vaga python", "anything at all", "VAGA"] {
            assert!(!filter.matches(text));
        }
        let filter = strict(&[], &[], &[]);
        assert!(!filter.matches("vaga python"));
    }

    #[test]
    fn empty_text_never_matches() {
        let filter = strict(&["python"], &[], &[]);
        assert!(!filter.matches(""));
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        let filter = strict(&["PYTHON"], &[], &["Vaga"]);
        assert!(filter.matches("VAGAS abertas: pythonista sênior"));
    }

    #[test]
    fn matches_is_deterministic_across_calls() {
        let filter = strict(&["python"], &["júnior"], &["vaga"]);
        let texts = ["vaga python", "vaga python júnior", "python"];
        let first: Vec<bool> = texts.iter().map(|t| filter.matches(t)).collect();
        let second: Vec<bool> = texts.iter().rev().map(|t| filter.matches(t)).collect();
        assert_eq!(first, second.into_iter().rev().collect::<Vec<_>>());
    }
}
