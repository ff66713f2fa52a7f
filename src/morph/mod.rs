//! Attribute morphing for templates.
//!
//! Rewrites elements carrying control attributes into template control-flow:
//!
//! ```text
//! <div if="@name">#@name</div>
//!   ↓
//! <?r if @name ?><div>#@name</div><?r end ?>
//! ```
//!
//! # Algorithm
//!
//! 1. Collect candidate rules whose `name=` occurs in the template. None
//!    means the template is returned as-is, without parsing.
//! 2. Parse the template into elements.
//! 3. Walk elements depth-first, parent before children. For every candidate
//!    rule the element carries (registry order), remove the attribute, render
//!    the rule's pattern and replace every occurrence of the element's
//!    previous serialization in the template.
//!
//! Replacement is textual: identical markup appearing twice is rewritten
//! twice, and a second attribute on the same element wraps the output of the
//! first rule, so it ends up nested inside it.

mod element;
mod error;
mod parser;
mod rule;


pub use element::{Attribute, Element};
pub use error::MorphError;
pub use parser::{Availability, FragmentParser, UnavailableParser, default_parser};
pub use rule::{CONTENT, ConfigureMode, EXPRESSION, MORPH, MorphRule, MorphRules};

#[cfg(feature = "tl")]
pub use parser::TlParser;

use crate::{debug, debug_do, log};
use parser::AvailabilityCell;

/// The morph stage: a rule registry plus an HTML fragment parser.
pub struct Morpher {
    rules: MorphRules,
    parser: Box<dyn FragmentParser>,
    availability: AvailabilityCell,
}

impl Default for Morpher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Morpher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Morpher")
            .field("rules", &self.rules)
            .field("parser", &self.parser.name())
            .field("availability", &self.availability.get())
            .finish()
    }
}

impl Morpher {
    /// Morpher with the built-in rules and the default parser.
    pub fn new() -> Self {
        Self::with_rules(MorphRules::default())
    }

    pub fn with_rules(rules: MorphRules) -> Self {
        Self {
            rules,
            parser: default_parser(),
            availability: AvailabilityCell::new(Availability::Unknown),
        }
    }

    /// Swap the fragment parser. Availability is probed again on next use.
    pub fn with_parser(mut self, parser: impl FragmentParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self.availability = AvailabilityCell::new(Availability::Unknown);
        self
    }

    /// Start from a known availability instead of probing.
    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = AvailabilityCell::new(availability);
        self
    }

    pub fn rules(&self) -> &MorphRules {
        &self.rules
    }

    pub fn configure<I>(&mut self, rules: I, mode: ConfigureMode)
    where
        I: IntoIterator<Item = MorphRule>,
    {
        self.rules.configure(rules, mode);
    }

    pub fn availability(&self) -> Availability {
        self.availability.get()
    }

    /// Morph `template`. Never fails: on any problem the input comes back.
    pub fn transform(&self, template: String) -> String {
        let candidates = self.rules.candidates(&template);
        if candidates.is_empty() {
            return template;
        }

        if !self.ensure_parser() {
            return template;
        }

        let mut elements = match self.parser.parse(&template) {
            Ok(elements) => elements,
            Err(err) => {
                log!("warning"; "{}, template left unmorphed", err);
                return template;
            }
        };

        debug_do! {
            let names: Vec<_> = candidates.iter().map(|r| r.name.as_str()).collect();
            debug!("morph"; "candidate rules: {}", names.join(", "));
        }

        let mut output = template;
        for element in &mut elements {
            morph_element(element, &candidates, &mut output);
        }
        output
    }

    /// Probe the parser on first use. `false` once it is known unavailable.
    fn ensure_parser(&self) -> bool {
        match self.availability.get() {
            Availability::Available => return true,
            Availability::Unavailable => return false,
            Availability::Unknown => {}
        }

        let (state, settled) = match self.parser.probe() {
            Ok(()) => self.availability.settle(Availability::Available),
            Err(err) => {
                let (state, settled) = self.availability.settle(Availability::Unavailable);
                if settled {
                    log!("warning"; "{}; morphing disabled, templates pass through unchanged", err);
                }
                (state, settled)
            }
        };
        if settled {
            debug!("morph"; "parser `{}` is {:?}", self.parser.name(), state);
        }
        state == Availability::Available
    }
}

/// Apply `rules` to `element`, then to its children.
///
/// Parents go first: their rewrite re-embeds the children's source text
/// verbatim, so the children can still be found in `template` afterwards.
fn morph_element(element: &mut Element, rules: &[&MorphRule], template: &mut String) {
    for rule in rules {
        let Some(expression) = element.attribute(&rule.name).map(str::to_owned) else {
            continue;
        };

        let old = element.to_html().into_owned();
        element.remove_attribute(&rule.name);
        let replacement = rule.render(&expression, &element.to_html());

        debug!("morph"; "<{}> {}=\"{}\"", element.name(), rule.name, expression);
        *template = template.replace(&old, &replacement);
    }

    for child in &mut element.children {
        morph_element(child, rules, template);
    }
}
