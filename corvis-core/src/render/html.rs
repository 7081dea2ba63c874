// HTML renderer: produces `index.html` with each document's text, mentions
// highlighted per entity, entity tables, decisions and error lists.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use tracing::{info, instrument};

use crate::analyze::{Decision, SystemDecisions};
use crate::types::{Document, Mention, Span};

use super::escape_html;
use super::traits::{Renderer, VisualizationData};

const PALETTE_SIZE: u32 = 12;

#[derive(Debug)]
pub struct HtmlRenderer;

#[async_trait::async_trait]
impl Renderer for HtmlRenderer {
    fn name(&self) -> &'static str {
        "html"
    }

    fn output_path(&self) -> &'static str {
        "index.html"
    }

    #[instrument(skip_all, name = "html_render")]
    async fn render(&self, data: &VisualizationData<'_>) -> crate::error::Result<String> {
        let out = render_page(data);
        info!(bytes = out.len(), "Visualization rendered");
        Ok(out)
    }
}

// ── Page ─────────────────────────────────────────────────────────────

fn render_page(data: &VisualizationData<'_>) -> String {
    let mut h = String::with_capacity(16_384);
    let label = escape_html(data.label);

    let _ = writeln!(h, "<!DOCTYPE html>");
    let _ = writeln!(h, "<html lang=\"en\">");
    let _ = writeln!(h, "<head>");
    let _ = writeln!(h, "<meta charset=\"utf-8\">");
    let _ = writeln!(h, "<title>Coreference: {label}</title>");
    let _ = writeln!(h, "<style>{PAGE_CSS}</style>");
    let _ = writeln!(h, "</head>");
    let _ = writeln!(h, "<body>");
    let _ = writeln!(h, "<h1>Coreference: {label}</h1>");
    let _ = writeln!(
        h,
        "<p class=\"meta\">Recall strategy <code>{}</code>, precision strategy <code>{}</code>. Generated {}.</p>",
        data.analysis.recall_algorithm,
        data.analysis.precision_algorithm,
        data.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
    );

    render_summary(&mut h, data);

    for (system_label, system) in &data.analysis.systems {
        render_system(&mut h, data, system_label, system);
    }

    let _ = writeln!(h, "<footer>corvis {}</footer>", env!("CARGO_PKG_VERSION"));
    let _ = writeln!(h, "</body>");
    let _ = writeln!(h, "</html>");
    h
}

fn render_summary(h: &mut String, data: &VisualizationData<'_>) {
    let _ = writeln!(h, "<section class=\"summary\">");
    let _ = writeln!(h, "<h2>Summary</h2>");
    if data.analysis.systems.is_empty() {
        let _ = writeln!(h, "<p>No system output recorded.</p>");
        let _ = writeln!(h, "</section>");
        return;
    }
    if data.for_raw_input {
        let _ = writeln!(h, "<table><tr><th>System</th><th>Documents</th><th>Decisions</th></tr>");
    } else {
        let _ = writeln!(
            h,
            "<table><tr><th>System</th><th>Documents</th><th>Decisions</th><th>Recall errors</th><th>Precision errors</th></tr>"
        );
    }
    for (system_label, system) in &data.analysis.systems {
        let _ = write!(
            h,
            "<tr><td><a href=\"#{}\">{}</a></td><td>{}</td><td>{}</td>",
            anchor(system_label, None),
            escape_html(system_label),
            system.corpus.len(),
            system.decisions.len()
        );
        if !data.for_raw_input {
            let _ = write!(
                h,
                "<td>{}</td><td>{}</td>",
                system.recall_errors.len(),
                system.precision_errors.len()
            );
        }
        let _ = writeln!(h, "</tr>");
    }
    let _ = writeln!(h, "</table>");
    let _ = writeln!(h, "</section>");
}

fn render_system(h: &mut String, data: &VisualizationData<'_>, system_label: &str, system: &SystemDecisions) {
    let _ = writeln!(
        h,
        "<section class=\"system\" id=\"{}\">",
        anchor(system_label, None)
    );
    let _ = writeln!(h, "<h2>System: {}</h2>", escape_html(system_label));
    if system.corpus.is_empty() {
        let _ = writeln!(h, "<p>No documents.</p>");
    }

    for document in &system.corpus.documents {
        let doc_anchor = anchor(system_label, Some(&document.identifier));
        let _ = writeln!(h, "<article class=\"document\" id=\"{doc_anchor}\">");
        let _ = writeln!(h, "<h3>{}</h3>", escape_html(&document.identifier));

        let _ = writeln!(h, "<div class=\"text\">");
        render_text(h, document, &doc_anchor);
        let _ = writeln!(h, "</div>");

        render_entities(h, "System entities", &document.system_entities(), &doc_anchor);
        if !data.for_raw_input {
            let reference = data
                .analysis
                .reference
                .document(&document.identifier)
                .map(Document::reference_entities)
                .unwrap_or_default();
            render_entities(h, "Reference entities", &reference, &doc_anchor);
        }

        let in_document = |list: &[Decision]| -> Vec<Decision> {
            list.iter()
                .filter(|d| d.document == document.identifier)
                .cloned()
                .collect()
        };
        render_decisions(h, "Decisions", &in_document(&system.decisions), &doc_anchor);
        if !data.for_raw_input {
            render_decisions(h, "Recall errors", &in_document(&system.recall_errors), &doc_anchor);
            render_decisions(
                h,
                "Precision errors",
                &in_document(&system.precision_errors),
                &doc_anchor,
            );
        }
        let _ = writeln!(h, "</article>");
    }
    let _ = writeln!(h, "</section>");
}

// ── Document text ────────────────────────────────────────────────────

/// Tokens with system mentions wrapped in nested spans. A mention that
/// crosses an already open one is left unmarked.
fn render_text(h: &mut String, document: &Document, doc_anchor: &str) {
    let mut starts: BTreeMap<usize, Vec<&Mention>> = BTreeMap::new();
    for mention in &document.system_mentions {
        starts.entry(mention.span.begin).or_default().push(mention);
    }
    for group in starts.values_mut() {
        group.sort_by(|a, b| b.span.end.cmp(&a.span.end));
    }

    let mut open: Vec<usize> = Vec::new();
    for (position, token) in document.tokens.iter().enumerate() {
        if position > 0 && document.sentence_spans.iter().any(|s| s.begin == position) {
            let _ = writeln!(h, "<br>");
        } else if position > 0 {
            h.push(' ');
        }
        for mention in starts.get(&position).into_iter().flatten() {
            if open.last().is_some_and(|&end| end < mention.span.end) {
                continue;
            }
            let class = mention
                .set_id
                .map_or_else(|| "singleton".to_string(), |id| format!("e{}", id % PALETTE_SIZE));
            let _ = write!(
                h,
                "<span class=\"mention {class}\" id=\"{}\" title=\"{}\">",
                mention_anchor(doc_anchor, mention.span),
                entity_title(mention)
            );
            open.push(mention.span.end);
        }
        h.push_str(&escape_html(&token.text));
        while open.last() == Some(&position) {
            h.push_str("</span>");
            open.pop();
        }
    }
    while open.pop().is_some() {
        h.push_str("</span>");
    }
    h.push('\n');
}

fn entity_title(mention: &Mention) -> String {
    let entity = mention
        .set_id
        .map_or_else(|| "singleton".to_string(), |id| format!("entity {id}"));
    format!("{} {}", mention.mention_type, entity)
}

// ── Panels ───────────────────────────────────────────────────────────

fn render_entities(h: &mut String, title: &str, entities: &BTreeMap<u32, Vec<&Mention>>, doc_anchor: &str) {
    let _ = writeln!(h, "<details class=\"entities\"><summary>{title} ({})</summary>", entities.len());
    if entities.is_empty() {
        let _ = writeln!(h, "<p>None.</p>");
    } else {
        let _ = writeln!(h, "<table><tr><th>Entity</th><th>Mentions</th></tr>");
        for (id, mentions) in entities {
            let links: Vec<String> = mentions
                .iter()
                .map(|m| {
                    format!(
                        "<a href=\"#{}\">{}</a>",
                        mention_anchor(doc_anchor, m.span),
                        escape_html(&m.text())
                    )
                })
                .collect();
            let _ = writeln!(
                h,
                "<tr><td class=\"e{}\">{id}</td><td>{}</td></tr>",
                id % PALETTE_SIZE,
                links.join(", ")
            );
        }
        let _ = writeln!(h, "</table>");
    }
    let _ = writeln!(h, "</details>");
}

fn render_decisions(h: &mut String, title: &str, decisions: &[Decision], doc_anchor: &str) {
    let _ = writeln!(h, "<details class=\"decisions\"><summary>{title} ({})</summary>", decisions.len());
    if decisions.is_empty() {
        let _ = writeln!(h, "<p>None.</p>");
    } else {
        let _ = writeln!(h, "<ol>");
        for d in decisions {
            let _ = writeln!(
                h,
                "<li><a href=\"#{}\">{}</a> <span class=\"type\">{}</span> &rarr; <a href=\"#{}\">{}</a> <span class=\"type\">{}</span></li>",
                mention_anchor(doc_anchor, d.anaphor.span),
                escape_html(&d.anaphor.text),
                d.anaphor.mention_type,
                mention_anchor(doc_anchor, d.antecedent.span),
                escape_html(&d.antecedent.text),
                d.antecedent.mention_type,
            );
        }
        let _ = writeln!(h, "</ol>");
    }
    let _ = writeln!(h, "</details>");
}

// ── Anchors ──────────────────────────────────────────────────────────

/// HTML id for a system, or a document of a system. Anything outside
/// `[A-Za-z0-9_-]` becomes `_`.
fn anchor(system: &str, document: Option<&str>) -> String {
    let raw = match document {
        Some(document) => format!("{system}-{document}"),
        None => format!("system-{system}"),
    };
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn mention_anchor(doc_anchor: &str, span: Span) -> String {
    format!("{doc_anchor}-m{}-{}", span.begin, span.end)
}

const PAGE_CSS: &str = "\
body{font-family:-apple-system,BlinkMacSystemFont,\"Segoe UI\",sans-serif;\
max-width:1040px;margin:0 auto;padding:2rem;color:#333;background:#fafafa}\
h1{border-bottom:2px solid #333;padding-bottom:.5rem}\
h2{margin-top:2rem;color:#2c3e50}\
.meta{color:#7f8c8d}\
.document{background:#fff;padding:1.5rem;margin:1.5rem 0;border-radius:8px;\
box-shadow:0 1px 3px rgba(0,0,0,.1)}\
.text{line-height:2.1;margin-bottom:1rem}\
.mention{border-radius:3px;padding:1px 2px;border-bottom:2px solid transparent}\
.mention:target{outline:2px solid #e74c3c}\
.singleton{border-bottom-color:#bbb}\
.type{font-size:.75em;color:#7f8c8d}\
table{border-collapse:collapse;width:100%;margin:1rem 0}\
th,td{padding:.4rem .75rem;text-align:left;border-bottom:1px solid #e0e0e0}\
th{background:#f8f9fa;font-weight:600}\
details{margin:.5rem 0}\
summary{cursor:pointer;font-weight:600}\
footer{margin-top:3rem;text-align:center;color:#aaa;font-size:.85rem}\
.e0{background:#fde2e1}.e1{background:#dff3e4}.e2{background:#e0ecfb}\
.e3{background:#fff3c4}.e4{background:#efe1f7}.e5{background:#d9f2f2}\
.e6{background:#fde6d2}.e7{background:#e6e9c8}.e8{background:#f6dbe8}\
.e9{background:#dde3ea}.e10{background:#e8f6d4}.e11{background:#f3e5d8}";
