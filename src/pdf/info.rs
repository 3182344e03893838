//! Document information dictionary updates built on top of `lopdf`.
//!
//! `genpdf` only records a title, so author and subject are patched into the
//! trailer's `/Info` dictionary after rendering.

use lopdf::{Dictionary, Document, Object};

/// Metadata written into the `/Info` dictionary.
#[derive(Clone, Copy, Debug)]
pub struct DocumentInfo<'a> {
    pub author: &'a str,
    pub subject: &'a str,
}

/// Reopens `pdf_bytes` and sets `/Author` and `/Subject`, creating `/Info` when absent.
pub fn apply_document_info(pdf_bytes: &[u8], info: &DocumentInfo<'_>) -> Result<Vec<u8>, lopdf::Error> {
    let mut document = Document::load_mem(pdf_bytes)?;

    let info_id = match document.trailer.get(b"Info").and_then(Object::as_reference) {
        Ok(id) => id,
        Err(_) => {
            let id = document.add_object(Dictionary::new());
            document.trailer.set("Info", Object::Reference(id));
            id
        }
    };

    let dictionary = document
        .get_object_mut(info_id)
        .and_then(Object::as_dict_mut)?;
    dictionary.set("Author", Object::string_literal(info.author));
    dictionary.set("Subject", Object::string_literal(info.subject));

    let mut buffer = Vec::new();
    document.save_to(&mut buffer).map_err(lopdf::Error::from)?;
    Ok(buffer)
}
