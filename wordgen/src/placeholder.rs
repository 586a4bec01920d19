//! `{{ name }}` tokens inside paragraphs.
//!
//! Word splits text in runs whenever formatting, spelling marks or revision ids change, so a
//! token typed in one go often ends up as `{{`, `mon` and `th}}` in three runs. Tokens are looked
//! for in the text of the whole paragraph and written back into the first run they touch.

use crate::xml::Element;
use std::{collections::BTreeMap, ops::Range};

pub type Values = BTreeMap<String, String>;

/// Containers that hold runs of the same paragraph
const RUN_CONTAINERS: [&str; 6] = [
    "w:hyperlink",
    "w:smartTag",
    "w:ins",
    "w:fldSimple",
    "w:sdt",
    "w:sdtContent",
];

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    span: Range<usize>,
    key: String,
}

/// Fill every paragraph below `root` and return the sorted names of the tokens that had no value
pub fn fill_placeholders(root: &mut Element, values: &Values) -> Vec<String> {
    let mut missing = Vec::new();

    root.visit_mut(&mut |element| {
        if element.name == "w:p" {
            fill_paragraph(element, values, &mut missing);
        }
    });

    missing.sort();
    missing.dedup();
    missing
}

/// Token names used below `root`
#[must_use]
pub fn placeholder_names(root: &Element) -> Vec<String> {
    let mut names = root
        .descendants("w:p")
        .into_iter()
        .flat_map(|p| {
            let text = text_paths(p)
                .iter()
                .filter_map(|path| p.at(path))
                .map(Element::own_text)
                .collect::<String>();
            find_tokens(&text).into_iter().map(|t| t.key)
        })
        .collect::<Vec<_>>();

    names.sort();
    names.dedup();
    names
}

fn fill_paragraph(paragraph: &mut Element, values: &Values, missing: &mut Vec<String>) {
    let paths = text_paths(paragraph);
    let texts = paths
        .iter()
        .map(|path| paragraph.at(path).map(Element::own_text).unwrap_or_default())
        .collect::<Vec<_>>();

    let joined = texts.concat();
    let tokens = find_tokens(&joined);
    if tokens.is_empty() {
        return;
    }

    let starts = texts
        .iter()
        .scan(0, |offset, t| {
            let start = *offset;
            *offset += t.len();
            Some(start)
        })
        .collect::<Vec<_>>();
    let holder = |at: usize| {
        starts
            .iter()
            .zip(&texts)
            .position(|(start, t)| (*start..start + t.len()).contains(&at))
    };

    // Tokens sharing a run are rewritten together, each group into its own first run
    let mut groups: Vec<(usize, usize, Vec<&Token>)> = Vec::new();
    for token in &tokens {
        let (Some(first), Some(last)) = (holder(token.span.start), holder(token.span.end - 1))
        else {
            continue;
        };

        match groups.last_mut() {
            Some((_, group_last, members)) if first <= *group_last => {
                *group_last = (*group_last).max(last);
                members.push(token);
            }
            _ => groups.push((first, last, vec![token])),
        }
    }

    for (first, last, members) in groups {
        let mut replaced = String::new();
        let mut cursor = starts[first];

        for token in members {
            replaced.push_str(&joined[cursor..token.span.start]);
            match values.get(&token.key) {
                Some(value) => replaced.push_str(value),
                None => {
                    replaced.push_str(&joined[token.span.clone()]);
                    missing.push(token.key.clone());
                }
            }
            cursor = token.span.end;
        }
        replaced.push_str(&joined[cursor..starts[last] + texts[last].len()]);

        for (i, path) in paths.iter().enumerate().take(last + 1).skip(first) {
            if let Some(text) = paragraph.at_mut(path) {
                text.set_text(if i == first { &replaced } else { "" });
                text.set_attr("xml:space", "preserve");
            }
        }
    }
}

/// Paths (child positions) from `paragraph` to its `w:t` elements. Nested paragraphs, like the
/// ones of a text box inside a drawing, are left for their own pass.
fn text_paths(paragraph: &Element) -> Vec<Vec<usize>> {
    fn walk(element: &Element, path: &mut Vec<usize>, found: &mut Vec<Vec<usize>>) {
        for (i, child) in element.children.iter().enumerate() {
            let crate::xml::Node::Element(child) = child else {
                continue;
            };

            path.push(i);
            if child.name == "w:r" {
                for (j, t) in child.children.iter().enumerate() {
                    if matches!(t, crate::xml::Node::Element(t) if t.name == "w:t") {
                        let mut t_path = path.clone();
                        t_path.push(j);
                        found.push(t_path);
                    }
                }
            } else if RUN_CONTAINERS.contains(&child.name.as_str()) {
                walk(child, path, found);
            }
            path.pop();
        }
    }

    let mut found = Vec::new();
    walk(paragraph, &mut Vec::new(), &mut found);
    found
}

fn find_tokens(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut from = 0;

    while let Some(open) = text[from..].find("{{").map(|i| i + from) {
        let Some(close) = text[open + 2..].find("}}").map(|i| i + open + 2) else {
            break;
        };

        let inner = &text[open + 2..close];
        // `{{{{ a }}` keeps looking from the innermost opening
        if let Some(nested) = inner.rfind("{{") {
            from = open + 2 + nested;
            continue;
        }

        let key = inner.trim().to_lowercase();
        if !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
        {
            tokens.push(Token {
                span: open..close + 2,
                key,
            });
        }
        from = close + 2;
    }

    tokens
}
