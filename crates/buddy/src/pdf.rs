//! Plain text extraction from PDF documents.
//!
//! Pages are extracted one at a time. A page whose text cannot be read contributes an empty
//! string, so one bad page never loses the rest of the document. Only a document that cannot be
//! parsed at all is an error.

use anyhow::{Context, Result};
use lopdf::Document;
use std::path::Path;

/// Text of every page, in page order
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<String>> {
    let doc = Document::load_mem(bytes).context("Failed to parse PDF document")?;
    Ok(pages_text(&doc))
}

/// Text of every page joined with `separator`
pub fn extract_text(bytes: &[u8], separator: &str) -> Result<String> {
    Ok(extract_pages(bytes)?.join(separator))
}

pub fn extract_text_from_path(path: &Path, separator: &str) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    extract_text(&bytes, separator).with_context(|| format!("Failed to extract {}", path.display()))
}

fn pages_text(doc: &Document) -> Vec<String> {
    doc.get_pages()
        .keys()
        .map(|&page_number| match doc.extract_text(&[page_number]) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(page = page_number, "Unreadable PDF page: {}", e);
                String::new()
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, ObjectId, Stream};

    /// Build a PDF with one page per entry. `None` makes a page whose content stream is missing.
    pub fn pdf_with_pages(pages: &[Option<&str>]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids: Vec<Object> = Vec::new();
        for page in pages {
            let contents: ObjectId = match page {
                Some(text) => {
                    let content = Content {
                        operations: vec![
                            Operation::new("BT", vec![]),
                            Operation::new("Tf", vec!["F1".into(), 24.into()]),
                            Operation::new("Td", vec![100.into(), 600.into()]),
                            Operation::new("Tj", vec![Object::string_literal(*text)]),
                            Operation::new("ET", vec![]),
                        ],
                    };
                    doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()))
                }
                None => (9999, 0),
            };
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => contents,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }
}
