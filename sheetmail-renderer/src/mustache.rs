//! Mustache → Tera compilation.
//!
//! Templates are written in logic-less mustache syntax and rendered by Tera.
//! Compilation rewrites each mustache tag into Tera markup that reads a
//! numbered slot (`field_0`, `field_1`, …) instead of the field name itself,
//! so header text containing spaces, dots or quotes needs no escaping.
//!
//! | Mustache              | Tera                                    |
//! |-----------------------|-----------------------------------------|
//! | `{{name}}`            | `{{ field_N }}` (autoescaped)           |
//! | `{{{name}}}`, `{{&name}}` | `{{ field_N \| safe }}`             |
//! | `{{#name}}…{{/name}}` | `{% if field_N %}…{% endif %}`          |
//! | `{{^name}}…{{/name}}` | `{% if not field_N %}…{% endif %}`      |
//! | `{{! comment }}`      | dropped                                 |
//! | `{{.}}` in a section  | the section's own slot                  |
//!
//! Every `{` in literal text is emitted as a Tera string expression so that
//! no literal can open a Tera tag. Partials and delimiter changes are
//! rejected.

use crate::error::RenderError;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const TRIPLE_CLOSE: &str = "}}}";

/// A mustache template translated to Tera source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTemplate {
    source: String,
    slots: Vec<String>,
}

impl CompiledTemplate {
    /// Tera source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Field names referenced by the template; index `i` is slot `field_i`.
    pub fn slots(&self) -> &[String] {
        &self.slots
    }
}

/// Tera variable name for slot `idx`.
pub fn slot_ident(idx: usize) -> String {
    format!("field_{idx}")
}

struct Section {
    name: String,
    slot: usize,
    offset: usize,
}

struct Compiler {
    out: String,
    slots: Vec<String>,
    sections: Vec<Section>,
}

impl Compiler {
    fn slot_for(&mut self, name: &str) -> usize {
        if let Some(idx) = self.slots.iter().position(|s| s == name) {
            return idx;
        }
        self.slots.push(name.to_string());
        self.slots.len() - 1
    }

    fn literal(&mut self, text: &str) {
        for (i, piece) in text.split('{').enumerate() {
            if i > 0 {
                self.out.push_str("{{ \"{\" }}");
            }
            self.out.push_str(piece);
        }
    }

    fn variable(&mut self, name: &str, offset: usize, escaped: bool) -> Result<(), RenderError> {
        let slot = if name == "." {
            self.sections
                .last()
                .map(|s| s.slot)
                .ok_or_else(|| RenderError::Unsupported {
                    offset,
                    feature: "implicit iterator '{{.}}' outside a section".to_string(),
                })?
        } else {
            self.slot_for(name)
        };
        let ident = slot_ident(slot);
        if escaped {
            self.out.push_str(&format!("{{{{ {ident} }}}}"));
        } else {
            self.out.push_str(&format!("{{{{ {ident} | safe }}}}"));
        }
        Ok(())
    }

    fn open_section(&mut self, name: &str, offset: usize, inverted: bool) {
        let slot = self.slot_for(name);
        let ident = slot_ident(slot);
        if inverted {
            self.out.push_str(&format!("{{% if not {ident} %}}"));
        } else {
            self.out.push_str(&format!("{{% if {ident} %}}"));
        }
        self.sections.push(Section {
            name: name.to_string(),
            slot,
            offset,
        });
    }

    fn close_section(&mut self, name: &str, offset: usize) -> Result<(), RenderError> {
        match self.sections.pop() {
            Some(open) if open.name == name => {
                self.out.push_str("{% endif %}");
                Ok(())
            }
            Some(open) => Err(RenderError::Syntax {
                offset,
                message: format!("closing '{name}' but '{}' is open", open.name),
            }),
            None => Err(RenderError::Syntax {
                offset,
                message: format!("closing '{name}' without an open section"),
            }),
        }
    }
}

/// Compile a mustache template into Tera source.
pub fn compile(template: &str) -> Result<CompiledTemplate, RenderError> {
    let mut c = Compiler {
        out: String::with_capacity(template.len()),
        slots: Vec::new(),
        sections: Vec::new(),
    };
    let mut pos = 0;

    while let Some(rel) = template[pos..].find(OPEN) {
        let start = pos + rel;
        c.literal(&template[pos..start]);

        // Triple mustache: {{{name}}}
        if template[start..].starts_with("{{{") {
            let body_start = start + 3;
            let end = template[body_start..]
                .find(TRIPLE_CLOSE)
                .map(|i| body_start + i)
                .ok_or_else(|| unclosed(start))?;
            let name = tag_name(&template[body_start..end], start)?;
            c.variable(name, start, false)?;
            pos = end + TRIPLE_CLOSE.len();
            continue;
        }

        let body_start = start + OPEN.len();
        let end = template[body_start..]
            .find(CLOSE)
            .map(|i| body_start + i)
            .ok_or_else(|| unclosed(start))?;
        let body = &template[body_start..end];
        pos = end + CLOSE.len();

        let mut chars = body.trim_start().chars();
        match chars.next() {
            Some('!') => {}
            Some('#') => c.open_section(tag_name(chars.as_str(), start)?, start, false),
            Some('^') => c.open_section(tag_name(chars.as_str(), start)?, start, true),
            Some('/') => c.close_section(tag_name(chars.as_str(), start)?, start)?,
            Some('&') => c.variable(tag_name(chars.as_str(), start)?, start, false)?,
            Some('>') => {
                return Err(RenderError::Unsupported {
                    offset: start,
                    feature: "partials".to_string(),
                })
            }
            Some('=') => {
                return Err(RenderError::Unsupported {
                    offset: start,
                    feature: "delimiter changes".to_string(),
                })
            }
            _ => c.variable(tag_name(body, start)?, start, true)?,
        }
    }
    c.literal(&template[pos..]);

    if let Some(open) = c.sections.pop() {
        return Err(RenderError::Syntax {
            offset: open.offset,
            message: format!("section '{}' is never closed", open.name),
        });
    }

    Ok(CompiledTemplate {
        source: c.out,
        slots: c.slots,
    })
}

fn tag_name(raw: &str, offset: usize) -> Result<&str, RenderError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(RenderError::Syntax {
            offset,
            message: "empty tag".to_string(),
        });
    }
    Ok(name)
}

fn unclosed(offset: usize) -> RenderError {
    RenderError::Syntax {
        offset,
        message: "unclosed tag".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_untouched() {
        let t = compile("<p>Hello</p>\n").unwrap();
        assert_eq!(t.source(), "<p>Hello</p>\n");
        assert!(t.slots().is_empty());
    }

    #[test]
    fn variables_share_slots_by_name() {
        let t = compile("{{ name }} and {{name}} and {{{email}}}").unwrap();
        assert_eq!(t.slots(), &["name".to_string(), "email".to_string()]);
        assert_eq!(
            t.source(),
            "{{ field_0 }} and {{ field_0 }} and {{ field_1 | safe }}"
        );
    }

    #[test]
    fn names_keep_inner_spaces_and_dots() {
        let t = compile("{{ First Name }} {{a.b}}").unwrap();
        assert_eq!(t.slots(), &["First Name".to_string(), "a.b".to_string()]);
    }

    #[test]
    fn literal_braces_cannot_open_tera_tags() {
        let t = compile("{% raw %} {# x #} {").unwrap();
        assert!(!t.source().contains("{%"));
        assert!(!t.source().contains("{#"));
    }

    #[test]
    fn sections_and_comments() {
        let t = compile("{{! note }}{{#vip}}VIP {{.}}{{/vip}}{{^vip}}regular{{/vip}}").unwrap();
        assert_eq!(
            t.source(),
            "{% if field_0 %}VIP {{ field_0 }}{% endif %}{% if not field_0 %}regular{% endif %}"
        );
    }

    #[test]
    fn standalone_tags_leave_surrounding_newlines() {
        let t = compile("{{! c }}\n{{#a}}\nx\n{{/a}}\n").unwrap();
        assert_eq!(t.source(), "\n{% if field_0 %}\nx\n{% endif %}\n");
    }

    #[test]
    fn mismatched_section_is_syntax_error() {
        let err = compile("{{#a}}x{{/b}}").unwrap_err();
        assert!(matches!(err, RenderError::Syntax { .. }), "got: {err}");
    }

    #[test]
    fn unclosed_section_is_syntax_error() {
        let err = compile("{{#a}}x").unwrap_err();
        assert!(err.to_string().contains("never closed"), "got: {err}");
    }

    #[test]
    fn unclosed_tag_is_syntax_error() {
        let err = compile("Hi {{name").unwrap_err();
        assert!(err.to_string().contains("unclosed tag"), "got: {err}");
    }

    #[test]
    fn partials_and_delimiters_are_rejected() {
        assert!(matches!(
            compile("{{> footer}}").unwrap_err(),
            RenderError::Unsupported { .. }
        ));
        assert!(matches!(
            compile("{{=<% %>=}}").unwrap_err(),
            RenderError::Unsupported { .. }
        ));
    }

    #[test]
    fn empty_tag_is_rejected() {
        assert!(matches!(compile("{{ }}").unwrap_err(), RenderError::Syntax { .. }));
    }
}
