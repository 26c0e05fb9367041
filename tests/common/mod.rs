//! Shared fixtures for the integration tests: a small library model and a
//! compiled module that generates one file per book.

#![allow(dead_code)]

use std::sync::Arc;

use tracegen::{ModelDocument, ModelSet, Module, ObjectId};

pub const LIBRARY_JSON: &str = r#"{
  "location": "library.json",
  "objects": [
    { "id": "lib", "class": "Library", "features": { "name": "City Library" } },
    { "id": "a1", "class": "Author", "container": "lib", "features": { "name": "Frank Herbert" } },
    { "id": "b1", "class": "Book", "container": "lib",
      "features": { "title": "Dune", "pages": 412, "author": { "ref": "a1" } } },
    { "id": "b2", "class": "Book", "container": "lib",
      "features": { "title": "Emma", "pages": 474 } }
  ]
}"#;

/// `bookFile(b)` writes `<title>.java` with a protected region per book.
/// `summary(lib)` lists the titles of the library's books.
/// `main(b)` is the entry point for whole-model generation.
pub const MODULE_JSON: &str = r#"{
  "name": "books",
  "location": "books.mtl",
  "elements": [
    { "kind": "template", "name": "bookFile",
      "parameters": [ { "name": "b", "type": "Book" } ],
      "body": [
        { "kind": "file",
          "url": { "kind": "call", "operation": "concat",
                   "source": { "kind": "feature", "feature": "title",
                               "source": { "kind": "variable", "name": "b" } },
                   "arguments": [ { "kind": "literal", "value": ".java" } ] },
          "body": [
            { "kind": "text", "value": "class " },
            { "kind": "expression", "expression":
              { "kind": "feature", "feature": "title",
                "source": { "kind": "variable", "name": "b" } } },
            { "kind": "text", "value": " {\n" },
            { "kind": "protected", "prefix": "  // ",
              "id": { "kind": "feature", "feature": "title",
                      "source": { "kind": "variable", "name": "b" } },
              "body": [ { "kind": "text", "value": "  // add members here\n" } ] },
            { "kind": "text", "value": "}\n" }
          ] }
      ] },
    { "kind": "template", "name": "summary",
      "parameters": [ { "name": "l", "type": "Library" } ],
      "body": [
        { "kind": "expression", "expression":
          { "kind": "feature", "feature": "name", "source": { "kind": "variable", "name": "l" } } },
        { "kind": "text", "value": ": " },
        { "kind": "for", "variable": "b", "separator": ", ",
          "source": { "kind": "iterate", "iterator": "select", "variable": "x",
                      "source": { "kind": "call", "operation": "eContents",
                                  "source": { "kind": "variable", "name": "l" } },
                      "body": { "kind": "call", "operation": "=",
                                "source": { "kind": "call", "operation": "eClass",
                                            "source": { "kind": "variable", "name": "x" } },
                                "arguments": [ { "kind": "literal", "value": "Book" } ] } },
          "body": [
            { "kind": "expression", "expression":
              { "kind": "feature", "feature": "title",
                "source": { "kind": "variable", "name": "b" } } }
          ] }
      ] },
    { "kind": "query", "name": "label", "return_type": "String",
      "parameters": [ { "name": "b", "type": "Book" }, { "name": "prefix", "type": "String" } ],
      "body": { "kind": "call", "operation": "concat",
                "source": { "kind": "variable", "name": "prefix" },
                "arguments": [ { "kind": "feature", "feature": "title",
                                 "source": { "kind": "variable", "name": "b" } } ] } },
    { "kind": "template", "name": "main", "main": true,
      "parameters": [ { "name": "b", "type": "Book" } ],
      "body": [
        { "kind": "expression", "expression":
          { "kind": "invoke", "element": "bookFile",
            "arguments": [ { "kind": "variable", "name": "b" } ] } }
      ] }
  ]
}"#;

pub struct Library {
    pub models: Arc<ModelSet>,
    pub lib: ObjectId,
    pub dune: ObjectId,
    pub emma: ObjectId,
}

pub fn library() -> Library {
    let document = ModelDocument::from_json_str("library.json", LIBRARY_JSON).unwrap();
    let models = ModelSet::from_documents(vec![document]).unwrap();
    Library {
        lib: models.find("lib").unwrap(),
        dune: models.find("b1").unwrap(),
        emma: models.find("b2").unwrap(),
        models: Arc::new(models),
    }
}

pub fn module() -> Arc<Module> {
    Arc::new(Module::from_json_str(MODULE_JSON).unwrap())
}
