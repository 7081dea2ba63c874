// CoNLL-2012 reader.
//
// Token lines are whitespace separated: document, part, token number, word,
// POS, parse bit, lemma, frame, sense, speaker, NER columns, and the
// coreference column last. Blank lines separate sentences.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::error::CorpusError;
use crate::types::{Corpus, Document, Mention, MentionType, Span, Token};

const BEGIN: &str = "#begin document";
const END: &str = "#end document";
const DEMONSTRATIVES: [&str; 4] = ["this", "that", "these", "those"];
const PRONOUNS: [&str; 30] = [
    "i", "me", "my", "mine", "myself", "you", "your", "yours", "yourself", "he", "him", "his",
    "himself", "she", "her", "hers", "herself", "it", "its", "itself", "we", "us", "our", "ours",
    "they", "them", "their", "theirs", "themselves", "one",
];

/// Coreference annotation of one file: documents plus, per document, the
/// mentions found in the coreference column with their set ids.
struct ParsedDocument {
    document: Document,
    begin_line: usize,
    mentions: Vec<(Span, u32)>,
}

impl Corpus {
    /// Read a CoNLL file as reference annotation.
    pub fn from_conll(label: &str, text: &str) -> Result<Self, CorpusError> {
        let documents = parse(text)?
            .into_iter()
            .map(|parsed| {
                let mut document = parsed.document;
                document.annotated_mentions = build_mentions(&document, &parsed.mentions, false);
                document
            })
            .collect();
        Ok(Corpus::new(label, documents))
    }

    /// Read a reference file and a system file over the same tokens. The
    /// system file fills `system_mentions`; each system mention's antecedent
    /// is the closest preceding mention of its entity.
    pub fn from_conll_pair(label: &str, reference: &str, system: &str) -> Result<Self, CorpusError> {
        let mut corpus = Self::from_conll(label, reference)?;
        let positions: HashMap<String, usize> = corpus
            .documents
            .iter()
            .enumerate()
            .map(|(i, d)| (d.identifier.clone(), i))
            .collect();

        for parsed in parse(system)? {
            let Some(&index) = positions.get(&parsed.document.identifier) else {
                return Err(CorpusError::Malformed {
                    line: parsed.begin_line,
                    message: format!(
                        "system document {} is missing from the reference",
                        parsed.document.identifier
                    ),
                });
            };
            let document = &mut corpus.documents[index];
            if document.tokens.len() != parsed.document.tokens.len() {
                return Err(CorpusError::Malformed {
                    line: parsed.begin_line,
                    message: format!(
                        "system document {} has {} tokens, reference has {}",
                        document.identifier,
                        parsed.document.tokens.len(),
                        document.tokens.len()
                    ),
                });
            }
            document.system_mentions = build_mentions(document, &parsed.mentions, true);
        }
        Ok(corpus)
    }
}

fn parse(text: &str) -> Result<Vec<ParsedDocument>, CorpusError> {
    let mut documents = Vec::new();
    let mut current: Option<DocumentBuilder> = None;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();

        if let Some(rest) = line.strip_prefix(BEGIN) {
            if current.is_some() {
                return Err(malformed(line_no, "document begins before the previous one ended"));
            }
            current = Some(DocumentBuilder::new(rest.trim(), line_no));
        } else if line.starts_with(END) {
            let builder = current
                .take()
                .ok_or_else(|| malformed(line_no, "#end document without #begin document"))?;
            documents.push(builder.finish(line_no)?);
        } else if line.is_empty() {
            if let Some(builder) = current.as_mut() {
                builder.end_sentence();
            }
        } else if line.starts_with('#') {
            continue;
        } else {
            let builder = current
                .as_mut()
                .ok_or_else(|| malformed(line_no, "token line outside a document"))?;
            builder.push_token(line, line_no)?;
        }
    }

    if let Some(builder) = current {
        return Err(malformed(
            builder.begin_line,
            &format!("document {} is never closed", builder.document.identifier),
        ));
    }
    debug!(documents = documents.len(), "CoNLL input parsed");
    Ok(documents)
}

fn malformed(line: usize, message: &str) -> CorpusError {
    CorpusError::Malformed {
        line,
        message: message.to_string(),
    }
}

struct DocumentBuilder {
    document: Document,
    begin_line: usize,
    sentence_start: usize,
    open: HashMap<u32, Vec<usize>>,
    mentions: Vec<(Span, u32)>,
}

impl DocumentBuilder {
    fn new(header: &str, begin_line: usize) -> Self {
        Self {
            document: Document::new(header),
            begin_line,
            sentence_start: 0,
            open: HashMap::new(),
            mentions: Vec::new(),
        }
    }

    fn push_token(&mut self, line: &str, line_no: usize) -> Result<(), CorpusError> {
        let columns: Vec<&str> = line.split_whitespace().collect();
        // Word and POS, then at least the coreference column after them.
        if columns.len() < 6 {
            return Err(malformed(
                line_no,
                &format!("expected at least 6 columns, found {}", columns.len()),
            ));
        }
        let position = self.document.tokens.len();
        let column = |i: usize| (*columns.get(i).unwrap_or(&"-")).to_string();
        self.document.tokens.push(Token {
            text: columns[3].to_string(),
            pos: columns[4].to_string(),
            lemma: if columns.len() > 7 { column(6) } else { "-".to_string() },
            ner: if columns.len() > 11 { column(10) } else { "-".to_string() },
            speaker: if columns.len() > 10 { column(9) } else { "-".to_string() },
        });

        let coref = columns[columns.len() - 1];
        if coref == "-" {
            return Ok(());
        }
        for part in coref.split('|') {
            let opens = part.starts_with('(');
            let closes = part.ends_with(')');
            let id = part.trim_start_matches('(').trim_end_matches(')');
            let id: u32 = id
                .parse()
                .map_err(|_| malformed(line_no, &format!("bad coreference entry {part:?}")))?;
            if opens {
                self.open.entry(id).or_default().push(position);
            }
            if closes {
                let begin = self
                    .open
                    .get_mut(&id)
                    .and_then(Vec::pop)
                    .ok_or_else(|| malformed(line_no, &format!("entity {id} closed but never opened")))?;
                self.mentions.push((Span::new(begin, position), id));
            }
        }
        Ok(())
    }

    fn end_sentence(&mut self) {
        let len = self.document.tokens.len();
        if len > self.sentence_start {
            self.document
                .sentence_spans
                .push(Span::new(self.sentence_start, len - 1));
            self.sentence_start = len;
        }
    }

    fn finish(mut self, line_no: usize) -> Result<ParsedDocument, CorpusError> {
        self.end_sentence();
        if let Some((id, _)) = self.open.iter().find(|(_, starts)| !starts.is_empty()) {
            return Err(malformed(line_no, &format!("entity {id} opened but never closed")));
        }
        self.mentions.sort();
        self.mentions.dedup_by_key(|(span, _)| *span);
        Ok(ParsedDocument {
            document: self.document,
            begin_line: self.begin_line,
            mentions: self.mentions,
        })
    }
}

/// Turn `(span, id)` pairs into mentions. System mentions get `set_id` and an
/// antecedent; reference mentions get `annotated_set_id`.
fn build_mentions(document: &Document, spans: &[(Span, u32)], system: bool) -> Vec<Mention> {
    let mut last_of_entity: BTreeMap<u32, Span> = BTreeMap::new();
    let mut mentions = Vec::with_capacity(spans.len());

    for &(span, id) in spans {
        let tokens = &document.tokens[span.begin..=span.end];
        let head = tokens.last().map(|t| t.text.clone()).unwrap_or_default();
        let mut mention = Mention {
            span,
            tokens: tokens.iter().map(|t| t.text.clone()).collect(),
            head: vec![head],
            mention_type: guess_type(tokens),
            sentence: document.sentence_of(span.begin).unwrap_or(0),
            annotated_set_id: None,
            set_id: None,
            antecedent: None,
        };
        if system {
            mention.set_id = Some(id);
            mention.antecedent = last_of_entity.insert(id, span);
        } else {
            mention.annotated_set_id = Some(id);
        }
        mentions.push(mention);
    }
    mentions
}

fn guess_type(tokens: &[Token]) -> MentionType {
    if let [token] = tokens {
        let word = token.text.to_lowercase();
        if DEMONSTRATIVES.contains(&word.as_str()) {
            return MentionType::Dem;
        }
        if token.pos.starts_with("PRP") || PRONOUNS.contains(&word.as_str()) {
            return MentionType::Pro;
        }
    }
    match tokens.last() {
        Some(head) if head.pos.starts_with("NNP") => MentionType::Nam,
        _ => MentionType::Nom,
    }
}
