#![allow(dead_code)]

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use sitemap_gen::UrlEntry;

/// `n` relative entries `/page/0` .. `/page/{n-1}`
pub fn numbered_entries(n: usize) -> Vec<UrlEntry> {
    (0..n).map(|i| UrlEntry::new(format!("/page/{}", i))).collect()
}

/// Text of every element named `name` in the document at `path`, in order
pub fn element_texts(path: &Path, name: &str) -> Vec<String> {
    let content = std::fs::read_to_string(path).unwrap();
    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    let mut texts = Vec::new();
    let mut inside = false;
    loop {
        match reader.read_event().unwrap() {
            Event::Start(e) if e.local_name().as_ref() == name.as_bytes() => inside = true,
            Event::End(e) if e.local_name().as_ref() == name.as_bytes() => inside = false,
            Event::Text(t) if inside => texts.push(t.unescape().unwrap().into_owned()),
            Event::Eof => break,
            _ => {}
        }
    }
    texts
}

/// Every `<loc>` of a document
pub fn locations(path: &Path) -> Vec<String> {
    element_texts(path, "loc")
}

/// Names of the files in `dir`, sorted
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
