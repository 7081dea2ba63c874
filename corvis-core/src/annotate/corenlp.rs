// Stanford CoreNLP annotator. Runs the Java pipeline as a child process and
// converts its JSON output into a `Document`.
//
// Token indices in the JSON are 1-based per sentence and mention end indices
// are exclusive; documents use 0-based inclusive spans over all tokens.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use crate::config::AnnotatorSection;
use crate::error::AnnotateError;
use crate::types::{Document, Mention, MentionType, Span, Token};

use super::traits::Annotator;

const BASE_ANNOTATORS: [&str; 6] = ["tokenize", "ssplit", "pos", "lemma", "ner", "parse"];
const COREF_ANNOTATOR: &str = "dcoref";
const DEMONSTRATIVES: [&str; 4] = ["this", "that", "these", "those"];
const STDERR_TAIL_LINES: usize = 20;

// ── JSON model ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CoreNlpDocument {
    #[serde(default)]
    pub sentences: Vec<CoreNlpSentence>,
    /// Coreference chains keyed by chain id.
    #[serde(default)]
    pub corefs: BTreeMap<String, Vec<CoreNlpMention>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoreNlpSentence {
    #[serde(default)]
    pub tokens: Vec<CoreNlpToken>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoreNlpToken {
    pub word: String,
    #[serde(default)]
    pub lemma: Option<String>,
    #[serde(default)]
    pub pos: Option<String>,
    #[serde(default)]
    pub ner: Option<String>,
    #[serde(default)]
    pub speaker: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreNlpMention {
    #[serde(rename = "type")]
    pub mention_type: String,
    pub start_index: usize,
    pub end_index: usize,
    pub head_index: usize,
    pub sent_num: usize,
}

// ── Annotator ────────────────────────────────────────────────────────

/// Runs a local CoreNLP installation once per document.
#[derive(Debug, Clone)]
pub struct CoreNlpAnnotator {
    location: PathBuf,
    with_coref: bool,
    settings: AnnotatorSection,
}

impl CoreNlpAnnotator {
    /// Point the annotator at an installation directory (the one holding the
    /// CoreNLP jars).
    pub fn new(
        location: &Path,
        with_coref: bool,
        settings: AnnotatorSection,
    ) -> Result<Self, AnnotateError> {
        if !location.is_dir() {
            return Err(AnnotateError::ToolNotFound(location.display().to_string()));
        }
        Ok(Self {
            location: location.to_path_buf(),
            with_coref,
            settings,
        })
    }

    pub fn annotators(&self) -> Vec<String> {
        let mut annotators: Vec<String> =
            BASE_ANNOTATORS.iter().map(|a| (*a).to_string()).collect();
        if self.with_coref {
            annotators.push(COREF_ANNOTATOR.to_string());
        }
        for extra in &self.settings.extra_annotators {
            if !annotators.contains(extra) {
                annotators.push(extra.clone());
            }
        }
        annotators
    }

    fn command(&self, input: &Path, output_dir: &Path) -> Command {
        let mut command = Command::new(&self.settings.java);
        command
            .arg(format!("-Xmx{}", self.settings.memory))
            .arg("-cp")
            .arg(self.location.join("*"))
            .arg(&self.settings.main_class)
            .arg("-annotators")
            .arg(self.annotators().join(","))
            .arg("-outputFormat")
            .arg("json")
            .arg("-outputDirectory")
            .arg(output_dir)
            .arg("-file")
            .arg(input)
            .kill_on_drop(true);
        command
    }
}

#[async_trait::async_trait]
impl Annotator for CoreNlpAnnotator {
    fn name(&self) -> &'static str {
        "corenlp"
    }

    #[instrument(skip(self, text), fields(chars = text.len()))]
    async fn annotate(&self, name: &str, text: &str) -> crate::error::Result<Document> {
        let work = tempfile::tempdir().map_err(AnnotateError::Io)?;
        let file_name = input_file_name(name);
        let input = work.path().join(&file_name);
        let output_dir = work.path().join("out");
        tokio::fs::write(&input, text)
            .await
            .map_err(AnnotateError::Io)?;
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(AnnotateError::Io)?;

        let seconds = self.settings.timeout_secs;
        let output = tokio::time::timeout(
            Duration::from_secs(seconds),
            self.command(&input, &output_dir).output(),
        )
        .await
        .map_err(|_| AnnotateError::Timeout {
            document: name.to_string(),
            seconds,
        })?
        .map_err(AnnotateError::Io)?;

        if !output.status.success() {
            return Err(AnnotateError::Process {
                document: name.to_string(),
                status: output.status.to_string(),
                stderr: stderr_tail(&output.stderr),
            }
            .into());
        }

        let json_path = output_dir.join(format!("{file_name}.json"));
        let raw = tokio::fs::read_to_string(&json_path)
            .await
            .map_err(|e| AnnotateError::Output {
                document: name.to_string(),
                message: format!("{}: {e}", json_path.display()),
            })?;
        debug!(bytes = raw.len(), "Annotation output read");

        let parsed: CoreNlpDocument =
            serde_json::from_str(&raw).map_err(|e| AnnotateError::Output {
                document: name.to_string(),
                message: e.to_string(),
            })?;

        Ok(document_from_json(name, &parsed, self.with_coref)?)
    }
}

/// File name CoreNLP sees for a document; its JSON lands next to it as
/// `<file name>.json`.
fn input_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "document.txt".to_string()
    } else {
        cleaned
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

// ── Conversion ───────────────────────────────────────────────────────

/// Convert CoreNLP JSON into a document. With `with_coref`, every chain
/// becomes one entity used both as reference and as system output; each
/// mention's antecedent is the previous mention of its chain.
pub fn document_from_json(
    name: &str,
    json: &CoreNlpDocument,
    with_coref: bool,
) -> Result<Document, AnnotateError> {
    let mut document = Document::new(name);
    let mut offsets = Vec::with_capacity(json.sentences.len());

    for sentence in &json.sentences {
        let begin = document.tokens.len();
        offsets.push(begin);
        document.tokens.extend(sentence.tokens.iter().map(|t| Token {
            text: t.word.clone(),
            pos: t.pos.clone().unwrap_or_else(|| "-".to_string()),
            lemma: t.lemma.clone().unwrap_or_else(|| "-".to_string()),
            ner: t.ner.clone().unwrap_or_else(|| "-".to_string()),
            speaker: t.speaker.clone().unwrap_or_else(|| "-".to_string()),
        }));
        if !sentence.tokens.is_empty() {
            document
                .sentence_spans
                .push(Span::new(begin, document.tokens.len() - 1));
        }
    }

    if !with_coref {
        return Ok(document);
    }

    let mut mentions = Vec::new();
    for (position, (chain_key, chain)) in json.corefs.iter().enumerate() {
        let chain_id = chain_key
            .parse::<u32>()
            .unwrap_or_else(|_| u32::try_from(position).unwrap_or(u32::MAX));

        let mut chain_mentions = chain
            .iter()
            .map(|m| convert_mention(name, json, &offsets, &document, m, chain_id))
            .collect::<Result<Vec<_>, _>>()?;
        chain_mentions.sort_by_key(|m| m.span);
        chain_mentions.dedup_by_key(|m| m.span);

        let mut previous: Option<Span> = None;
        for mention in &mut chain_mentions {
            mention.antecedent = previous;
            previous = Some(mention.span);
        }
        mentions.extend(chain_mentions);
    }
    mentions.sort_by_key(|m| m.span);

    document.annotated_mentions.clone_from(&mentions);
    document.system_mentions = mentions;
    Ok(document)
}

fn convert_mention(
    name: &str,
    json: &CoreNlpDocument,
    offsets: &[usize],
    document: &Document,
    raw: &CoreNlpMention,
    chain_id: u32,
) -> Result<Mention, AnnotateError> {
    let malformed = |message: String| AnnotateError::Output {
        document: name.to_string(),
        message,
    };

    let sentence = raw
        .sent_num
        .checked_sub(1)
        .filter(|s| *s < json.sentences.len())
        .ok_or_else(|| malformed(format!("mention in unknown sentence {}", raw.sent_num)))?;
    let sentence_len = json.sentences[sentence].tokens.len();
    if raw.start_index == 0 || raw.end_index <= raw.start_index || raw.end_index - 1 > sentence_len {
        return Err(malformed(format!(
            "mention indices {}..{} outside sentence {} of {sentence_len} tokens",
            raw.start_index, raw.end_index, raw.sent_num
        )));
    }

    let offset = offsets[sentence];
    let span = Span::new(offset + raw.start_index - 1, offset + raw.end_index - 2);
    let head_index = if (raw.start_index..raw.end_index).contains(&raw.head_index) {
        offset + raw.head_index - 1
    } else {
        span.end
    };

    let tokens: Vec<String> = document.tokens[span.begin..=span.end]
        .iter()
        .map(|t| t.text.clone())
        .collect();
    let head = document.tokens[head_index].text.clone();

    let mut mention_type = raw.mention_type.parse::<MentionType>().unwrap_or_else(|_| {
        warn!(label = %raw.mention_type, "Unknown mention type, treating as nominal");
        MentionType::Nom
    });
    if mention_type == MentionType::Pro && DEMONSTRATIVES.contains(&head.to_lowercase().as_str()) {
        mention_type = MentionType::Dem;
    }

    Ok(Mention {
        span,
        tokens,
        head: vec![head],
        mention_type,
        sentence,
        annotated_set_id: Some(chain_id),
        set_id: Some(chain_id),
        antecedent: None,
    })
}
