//! One document out of many pages of the same template.
//!
//! The first page is the base: its styles, numbering, headers and relationships are the ones the
//! merged document keeps. Every further page starts a new section that copies the page setup of
//! the base, so margins and orientation stay the same through the document.

use crate::{
    package::DocxPackage,
    xml::{Element, Node, XmlDocument},
    WordError, WordResult,
};

const BOOKMARKS: [&str; 2] = ["w:bookmarkStart", "w:bookmarkEnd"];

/// # Errors
///
/// Fails with [`WordError::NothingToMerge`] for an empty list or if a page is not a document
pub fn merge(pages: &[DocxPackage]) -> WordResult<DocxPackage> {
    let (first, rest) = pages.split_first().ok_or(WordError::NothingToMerge)?;

    let mut merged = first.clone();
    let mut doc = first.document()?;
    let body = body_mut(&mut doc)?;

    let section = final_section(body).and_then(|i| match &body.children[i] {
        Node::Element(e) => Some(e.clone()),
        _ => None,
    });
    if section.is_none() {
        log::debug!("The first page has no section properties, pages are split with page breaks");
    }

    let mut next_bookmark = max_bookmark(body).map_or(0, |max| max + 1);

    for page in rest {
        let mut page_doc = page.document()?;
        let page_body = body_mut(&mut page_doc)?;
        if let Some(i) = final_section(page_body) {
            page_body.children.remove(i);
        }

        let mut content = std::mem::take(&mut page_body.children);
        let offset = next_bookmark;
        for node in &mut content {
            if let Node::Element(e) = node {
                shift_bookmarks(e, offset);
                if let Some(max) = max_bookmark(e) {
                    next_bookmark = next_bookmark.max(max + 1);
                }
            }
        }

        let at = final_section(body).unwrap_or(body.children.len());
        let mut inserted = vec![Node::Element(section_break(section.as_ref()))];
        inserted.extend(content);
        body.children.splice(at..at, inserted);
    }

    renumber_drawings(&mut doc.root);
    merged.set_document(&doc)?;
    log::debug!("Merged {} page(s)", pages.len());

    Ok(merged)
}

fn body_mut(doc: &mut XmlDocument) -> WordResult<&mut Element> {
    doc.root
        .child_mut("w:body")
        .ok_or_else(|| WordError::NotDocx("a page without body".to_string()))
}

/// Position of the `w:sectPr` closing the body, it must be its last element
fn final_section(body: &Element) -> Option<usize> {
    body.children
        .iter()
        .rposition(|n| matches!(n, Node::Element(_)))
        .filter(|i| matches!(&body.children[*i], Node::Element(e) if e.name == "w:sectPr"))
}

fn section_break(section: Option<&Element>) -> Element {
    match section {
        Some(section) => {
            let mut section = section.clone();
            // A section break paragraph without a type starts on the next page
            section
                .children
                .retain(|n| !matches!(n, Node::Element(e) if e.name == "w:type"));

            Element::new("w:p").with_child(Element::new("w:pPr").with_child(section))
        }
        None => Element::new("w:p").with_child(
            Element::new("w:r").with_child(Element::new("w:br").with_attr("w:type", "page")),
        ),
    }
}

fn bookmark_ids(element: &Element) -> impl Iterator<Item = u64> + '_ {
    BOOKMARKS
        .into_iter()
        .flat_map(|name| element.descendants(name))
        .chain(std::iter::once(element).filter(|e| BOOKMARKS.contains(&e.name.as_str())))
        .filter_map(|e| e.attr("w:id").and_then(|id| id.parse().ok()))
}

fn max_bookmark(element: &Element) -> Option<u64> {
    bookmark_ids(element).max()
}

fn shift_bookmarks(element: &mut Element, offset: u64) {
    element.visit_mut(&mut |e| {
        if !BOOKMARKS.contains(&e.name.as_str()) {
            return;
        }
        if let Some(id) = e.attr("w:id").and_then(|id| id.parse::<u64>().ok()) {
            e.set_attr("w:id", &(id + offset).to_string());
        }
    });
}

/// Drawing ids must be unique in the document, pages of one template repeat them
fn renumber_drawings(root: &mut Element) {
    let mut next = 1u32;
    root.visit_mut(&mut |e| {
        if e.name == "wp:docPr" {
            e.set_attr("id", &next.to_string());
            next += 1;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::fixtures::*;

    const SECTION: &str = r#"<w:sectPr><w:type w:val="continuous"/><w:pgSz w:w="16838" w:h="11906" w:orient="landscape"/></w:sectPr>"#;

    fn page(text: &str, with_section: bool) -> DocxPackage {
        let body = format!(
            r#"{}<w:bookmarkStart w:id="0" w:name="_GoBack"/><w:bookmarkEnd w:id="0"/><w:p><w:r><w:drawing><wp:inline><wp:docPr id="1" name="Logo"/></wp:inline></w:drawing></w:r></w:p>{}"#,
            paragraph(text),
            if with_section { SECTION } else { "" }
        );
        DocxPackage::from_bytes(&docx(&body, &[("word/header1.xml", "<w:hdr/>")])).unwrap()
    }

    fn body_names(doc: &XmlDocument) -> Vec<String> {
        doc.root
            .child("w:body")
            .unwrap()
            .elements()
            .map(|e| e.name.clone())
            .collect()
    }

    #[test]
    fn pages_become_sections() {
        let merged = merge(&[page("June", true), page("July", true), page("August", true)]).unwrap();
        let doc = merged.document().unwrap();

        let texts = doc
            .root
            .descendants("w:t")
            .iter()
            .map(|t| t.own_text())
            .collect::<Vec<_>>();
        assert_eq!(texts, vec!["June", "July", "August"]);

        let names = body_names(&doc);
        assert_eq!(names.last().map(String::as_str), Some("w:sectPr"));
        assert_eq!(names.iter().filter(|n| *n == "w:sectPr").count(), 1);

        // Two breaks, each carrying the page setup of the first page
        let breaks = doc.root.descendants("w:pPr");
        assert_eq!(breaks.len(), 2);
        for section in breaks.iter().filter_map(|p| p.child("w:sectPr")) {
            assert!(section.child("w:pgSz").is_some());
            assert!(section.child("w:type").is_none());
        }

        assert_eq!(
            merged.part_names().collect::<Vec<_>>(),
            vec!["[Content_Types].xml", "word/document.xml", "word/header1.xml"]
        );
    }

    #[test]
    fn ids_stay_unique() {
        let merged = merge(&[page("June", true), page("July", true)]).unwrap();
        let doc = merged.document().unwrap();

        let drawings = doc
            .root
            .descendants("wp:docPr")
            .iter()
            .filter_map(|d| d.attr("id"))
            .map(str::to_string)
            .collect::<Vec<_>>();
        assert_eq!(drawings, vec!["1", "2"]);

        let starts = doc
            .root
            .descendants("w:bookmarkStart")
            .iter()
            .filter_map(|b| b.attr("w:id"))
            .map(str::to_string)
            .collect::<Vec<_>>();
        assert_eq!(starts, vec!["0", "1"]);
    }

    #[test]
    fn page_breaks_without_section() {
        let merged = merge(&[page("June", false), page("July", false)]).unwrap();
        let doc = merged.document().unwrap();

        let breaks = doc.root.descendants("w:br");
        assert_eq!(breaks.len(), 1);
        assert_eq!(breaks[0].attr("w:type"), Some("page"));
        assert!(doc.root.descendants("w:sectPr").is_empty());
    }

    #[test]
    fn one_page_is_returned_as_is() {
        let single = page("June", true);
        let merged = merge(std::slice::from_ref(&single)).unwrap();
        assert_eq!(merged.document().unwrap(), single.document().unwrap());

        assert!(matches!(merge(&[]), Err(WordError::NothingToMerge)));
    }
}
