//! Post-assembly catalog edits: page labels and the initial view.
//!
//! Both are written straight into the document catalog after assembly. The
//! open action is never left to the assembler, since some viewers misread
//! destinations that carry the wrong number of coordinates; building the
//! array here keeps the operand count exact for each magnification.
//!
//! ```text
//! /PageLabels << /Nums [ 0 << /P (A-) /S /D /St 5 >> ] >>
//! /OpenAction [ 0 /FitH 792 ]
//! ```

use crate::config::{Magnification, ViewerDirective};
use crate::error::Jpeg2PdfError;
use crate::numbering::PageNumberSpec;
use crate::pipeline::assemble::text_string;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use tracing::debug;

/// Index of the page the viewer opens on.
const PAGE_TO_OPEN: i64 = 0;

/// Page-label dictionary for the single range starting at page 0.
///
/// Each entry is present only when it differs from the viewer default.
pub fn page_label(spec: Option<&PageNumberSpec>, first_page_number: u32) -> Dictionary {
    let mut label = Dictionary::new();
    if let Some(spec) = spec {
        if !spec.prefix.is_empty() {
            label.set("P", text_string(&spec.prefix));
        }
        if let Some(style) = spec.style {
            label.set("S", Object::Name(style.pdf_name()));
        }
    }
    if first_page_number > 1 {
        label.set("St", i64::from(first_page_number));
    }
    label
}

/// Page-tree depth searched for an inherited MediaBox.
const MAX_TREE_DEPTH: usize = 32;

/// Media box of a page, following `/Parent` when it is inherited.
fn media_box(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>, Jpeg2PdfError> {
    let mut node = doc.get_dictionary(page_id)?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(mb) = node.get(b"MediaBox") {
            let mb = match mb {
                Object::Reference(id) => doc.get_object(*id)?,
                other => other,
            };
            return Ok(mb.as_array()?.clone());
        }
        let parent = node.get(b"Parent").and_then(Object::as_reference).map_err(|_| {
            Jpeg2PdfError::CorruptDocument {
                detail: "first page has no MediaBox".into(),
            }
        })?;
        node = doc.get_dictionary(parent)?;
    }
    Err(Jpeg2PdfError::CorruptDocument {
        detail: "page tree too deep".into(),
    })
}

/// The document catalog, for editing.
fn catalog_mut(doc: &mut Document) -> Result<&mut Dictionary, Jpeg2PdfError> {
    let root = doc.trailer.get(b"Root")?.as_reference()?;
    Ok(doc.get_object_mut(root)?.as_dict_mut()?)
}

/// Destination array for the initial view.
///
/// `FitH` needs the top of the page (its height), `FitV` the left edge (0),
/// and `Fit` nothing.
pub fn open_action(
    doc: &Document,
    magnification: Magnification,
) -> Result<Vec<Object>, Jpeg2PdfError> {
    let mut dest = vec![
        Object::Integer(PAGE_TO_OPEN),
        Object::Name(magnification.pdf_name().as_bytes().to_vec()),
    ];
    match magnification {
        Magnification::FitWidth => {
            let first = doc.get_pages().values().next().copied().ok_or_else(|| {
                Jpeg2PdfError::CorruptDocument {
                    detail: "document has no pages".into(),
                }
            })?;
            let mb = media_box(doc, first)?;
            let top = mb.get(3).cloned().ok_or_else(|| Jpeg2PdfError::CorruptDocument {
                detail: "MediaBox has fewer than four entries".into(),
            })?;
            dest.push(top);
        }
        Magnification::FitHeight => dest.push(Object::Integer(0)),
        Magnification::FitPage => {}
    }
    Ok(dest)
}

/// Install page labels and, when a magnification is set, the open action.
pub fn apply(
    doc: &mut Document,
    spec: Option<&PageNumberSpec>,
    viewer: &ViewerDirective,
    first_page_number: u32,
) -> Result<(), Jpeg2PdfError> {
    let label = page_label(spec, first_page_number);
    let action = viewer
        .magnification
        .map(|m| open_action(doc, m))
        .transpose()?;

    let catalog = catalog_mut(doc)?;
    debug!("Setting page labels {:?}", label);
    catalog.set(
        "PageLabels",
        dictionary! {
            "Nums" => vec![Object::Integer(0), Object::Dictionary(label)],
        },
    );
    if let Some(dest) = action {
        debug!("Setting open action {:?}", dest);
        catalog.set("OpenAction", dest);
    }
    Ok(())
}

/// Load `pdf`, apply the catalog edits and serialise it again.
pub fn apply_to_bytes(
    pdf: &[u8],
    spec: Option<&PageNumberSpec>,
    viewer: &ViewerDirective,
    first_page_number: u32,
) -> Result<Vec<u8>, Jpeg2PdfError> {
    let mut doc = Document::load_mem(pdf)?;
    apply(&mut doc, spec, viewer, first_page_number)?;
    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| Jpeg2PdfError::Internal(format!("failed to serialise document: {e}")))?;
    Ok(out)
}
