//! Template transform pipeline.
//!
//! Templates pass through an ordered list of stages before they reach the
//! template compiler. The morph stage is the only built-in one; removing it
//! from the pipeline turns morphing off entirely.

use crate::morph::Morpher;

/// A single template-to-template rewrite.
pub trait TemplateTransform: Send + Sync {
    /// Stage name, used to look the stage up and in log messages.
    fn name(&self) -> &str;

    fn transform(&self, template: String) -> String;
}

impl TemplateTransform for Morpher {
    fn name(&self) -> &str {
        "morph"
    }

    fn transform(&self, template: String) -> String {
        Morpher::transform(self, template)
    }
}

/// Ordered list of transform stages.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn TemplateTransform>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipeline holding the given morph stage.
    pub fn standard(morpher: Morpher) -> Self {
        Self::new().with_stage(morpher)
    }

    pub fn with_stage(mut self, stage: impl TemplateTransform + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Remove the first stage named `name`. Returns whether one was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.stages.iter().position(|s| s.name() == name) {
            Some(pos) => {
                self.stages.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.name())
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run `template` through every stage in order.
    pub fn run(&self, template: String) -> String {
        self.stages
            .iter()
            .fold(template, |template, stage| stage.transform(template))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl TemplateTransform for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn transform(&self, template: String) -> String {
            template.to_uppercase()
        }
    }

    #[test]
    fn test_empty_pipeline_is_identity() {
        let pipeline = Pipeline::new();
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.run("<a if=\"x\">y</a>".into()), "<a if=\"x\">y</a>");
    }

    #[test]
    fn test_stages_run_in_order() {
        let pipeline = Pipeline::standard(Morpher::new()).with_stage(Upper);
        assert_eq!(pipeline.stage_names().collect::<Vec<_>>(), ["morph", "upper"]);
        assert_eq!(pipeline.run("plain".into()), "PLAIN");
    }

    #[cfg(feature = "tl")]
    #[test]
    fn test_standard_morphs() {
        let pipeline = Pipeline::standard(Morpher::new());
        assert_eq!(
            pipeline.run(r#"<div if="@name">#@name</div>"#.into()),
            "<?r if @name ?><div>#@name</div><?r end ?>"
        );
    }

    #[test]
    fn test_remove_morph_stage() {
        let mut pipeline = Pipeline::standard(Morpher::new());
        assert!(pipeline.remove("morph"));
        assert!(!pipeline.remove("morph"));

        let template = r#"<div if="@name">#@name</div>"#;
        assert_eq!(pipeline.run(template.into()), template);
    }
}
