//! Morph rules: attribute name → replacement pattern.
//!
//! A pattern may contain three placeholders:
//!
//! | Placeholder   | Substituted with                                  |
//! |---------------|---------------------------------------------------|
//! | `%morph`      | the rule (attribute) name, e.g. `if`              |
//! | `%expression` | the attribute value, verbatim                     |
//! | `%content`    | the element serialized without the attribute      |
//!
//! Rules are kept in registration order. That order decides nesting when an
//! element carries several recognized attributes: the first rule becomes the
//! outermost wrapper.

use serde::{Deserialize, Serialize};

/// Placeholder replaced by the rule name.
pub const MORPH: &str = "%morph";
/// Placeholder replaced by the attribute value.
pub const EXPRESSION: &str = "%expression";
/// Placeholder replaced by the serialized element.
pub const CONTENT: &str = "%content";

const CONDITIONAL: &str = "<?r %morph %expression ?>%content<?r end ?>";

/// Built-in rules, in registry order.
const DEFAULT_RULES: [(&str, &str); 5] = [
    ("if", CONDITIONAL),
    ("unless", CONDITIONAL),
    ("for", CONDITIONAL),
    ("each", "<?r %expression.%morph do |_e| ?>%content<?r end ?>"),
    ("times", "<?r %expression.%morph do |_t| ?>%content<?r end ?>"),
];

/// A single attribute trigger and its replacement pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorphRule {
    pub name: String,
    pub pattern: String,
}

impl MorphRule {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
        }
    }

    /// The substring whose presence makes this rule a candidate.
    pub fn trigger(&self) -> String {
        format!("{}=", self.name)
    }

    /// Fill the pattern's placeholders.
    ///
    /// Substitution is sequential (`%morph`, then `%expression`, then
    /// `%content`), so a placeholder appearing inside an expression is
    /// itself substituted by the later steps.
    pub fn render(&self, expression: &str, content: &str) -> String {
        self.pattern
            .replace(MORPH, &self.name)
            .replace(EXPRESSION, expression)
            .replace(CONTENT, content)
    }
}

/// How [`MorphRules::configure`] combines new rules with the current set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigureMode {
    /// Overwrite patterns of known names in place, append unknown names.
    #[default]
    Merge,
    /// Discard the current set first.
    Replace,
}

/// Ordered rule registry with unique names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MorphRules {
    rules: Vec<MorphRule>,
}

impl Default for MorphRules {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES
                .iter()
                .map(|(name, pattern)| MorphRule::new(*name, *pattern))
                .collect(),
        }
    }
}

impl MorphRules {
    /// An empty registry. Morphing with it is a no-op.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn configure<I>(&mut self, rules: I, mode: ConfigureMode)
    where
        I: IntoIterator<Item = MorphRule>,
    {
        if mode == ConfigureMode::Replace {
            self.rules.clear();
        }
        for rule in rules {
            self.insert(rule);
        }
    }

    /// Insert or overwrite a rule. Overwriting keeps the existing position.
    pub fn insert(&mut self, rule: MorphRule) {
        match self.rules.iter_mut().find(|r| r.name == rule.name) {
            Some(existing) => existing.pattern = rule.pattern,
            None => self.rules.push(rule),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<MorphRule> {
        let pos = self.rules.iter().position(|r| r.name == name)?;
        Some(self.rules.remove(pos))
    }

    pub fn get(&self, name: &str) -> Option<&MorphRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MorphRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules whose `name=` occurs somewhere in `template`, in registry order.
    ///
    /// This is a textual pre-filter: `if=` also matches inside `diff="..."`,
    /// the parsed attributes decide later.
    pub fn candidates(&self, template: &str) -> Vec<&MorphRule> {
        self.rules
            .iter()
            .filter(|rule| template.contains(&rule.trigger()))
            .collect()
    }
}

impl FromIterator<MorphRule> for MorphRules {
    fn from_iter<I: IntoIterator<Item = MorphRule>>(iter: I) -> Self {
        let mut rules = Self::empty();
        rules.configure(iter, ConfigureMode::Merge);
        rules
    }
}

impl<'a> IntoIterator for &'a MorphRules {
    type Item = &'a MorphRule;
    type IntoIter = std::slice::Iter<'a, MorphRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(rules: &MorphRules) -> Vec<&str> {
        rules.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_default_order() {
        let rules = MorphRules::default();
        assert_eq!(names(&rules), ["if", "unless", "for", "each", "times"]);
    }

    #[test]
    fn test_render_if() {
        let rules = MorphRules::default();
        let rule = rules.get("if").unwrap();
        assert_eq!(
            rule.render("@name", "<div>#@name</div>"),
            "<?r if @name ?><div>#@name</div><?r end ?>"
        );
    }

    #[test]
    fn test_render_each() {
        let rules = MorphRules::default();
        let rule = rules.get("each").unwrap();
        assert_eq!(
            rule.render("[1,2,3]", "<li>#{_e}</li>"),
            "<?r [1,2,3].each do |_e| ?><li>#{_e}</li><?r end ?>"
        );
    }

    #[test]
    fn test_render_is_sequential() {
        let rule = MorphRule::new("x", "[%expression]");
        // The expression is inserted before %content is substituted.
        assert_eq!(rule.render("%content", "C"), "[C]");
    }

    #[test]
    fn test_merge_keeps_position() {
        let mut rules = MorphRules::default();
        rules.configure(
            [
                MorphRule::new("for", "<?r %expression.each ?>%content<?r end ?>"),
                MorphRule::new("with", "%content"),
            ],
            ConfigureMode::Merge,
        );
        assert_eq!(
            names(&rules),
            ["if", "unless", "for", "each", "times", "with"]
        );
        assert_eq!(
            rules.get("for").unwrap().pattern,
            "<?r %expression.each ?>%content<?r end ?>"
        );
    }

    #[test]
    fn test_replace_discards() {
        let mut rules = MorphRules::default();
        rules.configure([MorphRule::new("only", "%content")], ConfigureMode::Replace);
        assert_eq!(names(&rules), ["only"]);
    }

    #[test]
    fn test_remove() {
        let mut rules = MorphRules::default();
        assert!(rules.remove("unless").is_some());
        assert!(rules.remove("unless").is_none());
        assert_eq!(rules.len(), 4);
    }

    #[test]
    fn test_candidates() {
        let rules = MorphRules::default();
        let found: Vec<_> = rules
            .candidates(r#"<a times="2">x</a><b if="y">z</b>"#)
            .into_iter()
            .map(|r| r.name.as_str())
            .collect();
        // Registry order, not document order.
        assert_eq!(found, ["if", "times"]);

        assert!(rules.candidates(r#"<div class="x">hi</div>"#).is_empty());
        assert!(MorphRules::empty().candidates(r#"<a if="x">"#).is_empty());
    }
}
