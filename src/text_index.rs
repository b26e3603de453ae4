use std::path::Path;

use tantivy::{
    Index,
    IndexReader,
    IndexWriter,
    TantivyDocument,
    TantivyError,
    Term,
    collector::{DocSetCollector, TopDocs},
    directory::MmapDirectory,
    query::{QueryParser, TermQuery},
    schema::*,
    tokenizer::{
        Language,
        LowerCaser,
        RemoveLongFilter,
        SimpleTokenizer,
        Stemmer,
        TextAnalyzer,
    },
};

use crate::{document::IndexedDocument, error::Result};

/// Memory budget handed to each index writer.
pub const WRITER_MEMORY_BUDGET: usize = 15_000_000;

/// Field names used in the schema.
pub mod fields {
    pub const PATH: &str = "path";
    pub const TITLE: &str = "title";
    pub const COURSE: &str = "course";
    pub const TERM: &str = "term";
    pub const TAGS: &str = "tags";
    pub const BODY: &str = "body";
    pub const MTIME: &str = "mtime";
}

/// Secondary lookup structure over document text and tags.
pub struct TextIndex {
    index: Index,
    reader: IndexReader,
    fields: SchemaFields,
}

#[derive(Clone, Copy)]
struct SchemaFields {
    path: Field,
    title: Field,
    course: Field,
    term: Field,
    tags: Field,
    body: Field,
    mtime: Field,
}

fn stemmed() -> TextFieldIndexing {
    TextFieldIndexing::default()
        .set_tokenizer("en_stem")
        .set_index_option(IndexRecordOption::WithFreqsAndPositions)
}

fn build_schema() -> (Schema, SchemaFields) {
    let mut builder = Schema::builder();
    let fields = SchemaFields {
        path: builder.add_text_field(fields::PATH, STRING | STORED),
        title: builder.add_text_field(
            fields::TITLE,
            TextOptions::default()
                .set_indexing_options(stemmed())
                .set_stored(),
        ),
        course: builder.add_text_field(fields::COURSE, STRING | STORED),
        term: builder.add_text_field(fields::TERM, STRING | STORED),
        // One raw term per tag, matched verbatim.
        tags: builder.add_text_field(fields::TAGS, STRING | STORED),
        body: builder.add_text_field(
            fields::BODY,
            TextOptions::default().set_indexing_options(stemmed()),
        ),
        mtime: builder.add_f64_field(fields::MTIME, STORED),
    };
    (builder.build(), fields)
}

impl TextIndex {
    /// Open the index in `dir`, creating it when the directory is empty.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let (schema, fields) = build_schema();
        let mmap_dir = MmapDirectory::open(dir).map_err(TantivyError::from)?;
        let index = Index::open_or_create(mmap_dir, schema)?;
        Self::with_index(index, fields)
    }

    /// In-memory index, for tests.
    pub fn open_in_ram() -> Result<Self> {
        let (schema, fields) = build_schema();
        Self::with_index(Index::create_in_ram(schema), fields)
    }

    fn with_index(index: Index, fields: SchemaFields) -> Result<Self> {
        let en_stem = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(RemoveLongFilter::limit(40))
            .filter(LowerCaser)
            .filter(Stemmer::new(Language::English))
            .build();
        index.tokenizers().register("en_stem", en_stem);
        let reader = index.reader()?;
        Ok(Self {
            index,
            reader,
            fields,
        })
    }

    pub fn writer(&self) -> Result<IndexWriter> {
        Ok(self.index.writer(WRITER_MEMORY_BUDGET)?)
    }

    /// Replace whatever is indexed under `doc.path` with `doc`. Each entry
    /// of `tags` is indexed as one exact term, commas included.
    pub fn upsert(
        &self,
        writer: &IndexWriter,
        doc: &IndexedDocument,
        tags: &[String],
    ) -> Result<()> {
        let f = self.fields;
        writer.delete_term(Term::from_field_text(f.path, &doc.path));

        let mut entry = TantivyDocument::default();
        entry.add_text(f.path, &doc.path);
        if let Some(title) = &doc.title {
            entry.add_text(f.title, title);
        }
        if let Some(course) = &doc.course {
            entry.add_text(f.course, course);
        }
        if let Some(term) = &doc.term {
            entry.add_text(f.term, term);
        }
        for tag in tags {
            entry.add_text(f.tags, tag);
        }
        entry.add_text(f.body, &doc.text);
        entry.add_f64(f.mtime, doc.mtime);

        writer.add_document(entry)?;
        Ok(())
    }

    pub fn delete_path(&self, writer: &IndexWriter, path: &str) -> Result<()> {
        let f = self.fields;
        writer.delete_term(Term::from_field_text(f.path, path));
        Ok(())
    }

    /// Paths of documents whose title or text matches `query_str`, best
    /// match first.
    pub fn paths_matching(
        &self,
        query_str: &str,
        limit: usize,
    ) -> Result<Vec<String>> {
        let f = self.fields;
        self.reader.reload()?;
        let searcher = self.reader.searcher();

        let parser = QueryParser::for_index(&self.index, vec![f.title, f.body]);
        let (query, _errors) = parser.parse_query_lenient(query_str);
        let top_docs = searcher.search(&query, &TopDocs::with_limit(limit))?;

        let mut paths = Vec::with_capacity(top_docs.len());
        for (_score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            paths.push(first_text(&doc, f.path));
        }
        Ok(paths)
    }

    /// Sorted paths of every document carrying exactly `tag`.
    pub fn paths_with_tag(&self, tag: &str) -> Result<Vec<String>> {
        let f = self.fields;
        self.reader.reload()?;
        let searcher = self.reader.searcher();

        let query = TermQuery::new(
            Term::from_field_text(f.tags, tag),
            IndexRecordOption::Basic,
        );
        let addresses = searcher.search(&query, &DocSetCollector)?;

        let mut paths = Vec::with_capacity(addresses.len());
        for address in addresses {
            let doc: TantivyDocument = searcher.doc(address)?;
            paths.push(first_text(&doc, f.path));
        }
        paths.sort();
        Ok(paths)
    }

    /// Number of live documents as of the last commit.
    pub fn num_docs(&self) -> Result<u64> {
        self.reader.reload()?;
        Ok(self.reader.searcher().num_docs())
    }
}

impl std::fmt::Debug for TextIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextIndex").finish_non_exhaustive()
    }
}

fn first_text(doc: &TantivyDocument, field: Field) -> String {
    doc.get_first(field)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}
