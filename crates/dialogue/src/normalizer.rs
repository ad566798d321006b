//! Splits a raw model response into visible text and hidden reasoning.
//!
//! Models emit reasoning in several dialects: `<think>` or `<thought>`
//! blocks (sometimes unclosed, sometimes only a stray `</think>`),
//! harmony-style `<|channel|>` segments, or plain-text headers. Extraction
//! tries an ordered list of [`Dialect`]s and stops at the first match; the
//! [`Artifact`] cleanup passes then always run on the visible part.
//!
//! Failure biases toward over-stripping: leaking reasoning into the other
//! agent's input is worse than losing a few words of reply.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Shown instead of an empty reply when the model produced only reasoning.
pub const REASONING_ONLY_PLACEHOLDER: &str =
    "[El modelo solo produjo razonamiento interno, sin mensaje visible.]";

const THOUGHT_JOINER: &str = "\n---\n";

static THINK_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<\s*think\s*>(.*?)<\s*/\s*think\s*>").expect("valid think block regex")
});
static THOUGHT_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<\s*thought\s*>(.*?)<\s*/\s*thought\s*>").expect("valid thought block regex")
});
static OPEN_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<\s*(?:think|thought)\s*>").expect("valid open tag regex")
});
static CLOSE_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<\s*/\s*(?:think|thought)\s*>").expect("valid close tag regex")
});
static HARMONY_FINAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<\|channel\|>\s*final\s*<\|message\|>").expect("valid harmony final regex")
});
static HARMONY_ANALYSIS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<\|channel\|>\s*analysis\s*<\|message\|>(.*?)(?:<\|end\|>|<\|start\|>|<\|channel\|>|$)")
        .expect("valid harmony analysis regex")
});
static HARMONY_END_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\|(?:end|return|im_end)\|>").expect("valid harmony end regex")
});
static HEADER_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:\*\*|#+\s*)?(?:thought|reasoning|pensamiento|an[aá]lisis)\s*(?:\*\*)?\s*:\s*(?:\*\*)?")
        .expect("valid reasoning header regex")
});
static RESPONSE_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\*\*|#+\s*)?\b(?:response|answer|respuesta|contestaci[oó]n)\s*(?:\*\*)?\s*:\s*(?:\*\*)?")
        .expect("valid response header regex")
});
static PARAGRAPH_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n").expect("valid paragraph break regex"));
static STRAY_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<\s*/?\s*(?:think|thought|thinking)\s*>").expect("valid stray tag regex")
});
static PIPE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\|[^|>]*\|>").expect("valid pipe token regex"));
static PIPE_TOKEN_FILLER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\|[^|>]*\|>[^\p{Lu}<]*").expect("valid pipe token filler regex")
});
static SENTENCE_MARKER_HUMAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<｜[^｜]*｜>\s*(?:Human|User)\s*:.*$").expect("valid sentence marker regex")
});
static SENTENCE_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<｜[^｜]*｜>").expect("valid sentence marker regex"));
static ROLE_LEAK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\n\s*(?:Human|User)\s*:.*$").expect("valid role leak regex")
});

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Result type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Normalized {
    pub visible: String,
    pub thought: Option<String>,
    /// The dialect that produced `thought`, for logging.
    pub dialect: Option<Dialect>,
}

impl Normalized {
    /// True when the visible text is the reasoning-only placeholder.
    pub fn is_reasoning_only(&self) -> bool {
        self.visible == REASONING_ONLY_PLACEHOLDER
    }
}

struct Extraction {
    visible: String,
    thought: String,
}

impl Extraction {
    fn new(visible: impl Into<String>, thought: impl Into<String>) -> Self {
        Self {
            visible: visible.into(),
            thought: thought.into(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Reasoning dialects
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One way a model family marks its reasoning. Tried in [`Dialect::ORDERED`]
/// order; the first that matches wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// One or more complete `<think>...</think>` blocks.
    ThinkBlock,
    /// One or more complete `<thought>...</thought>` blocks.
    ThoughtBlock,
    /// An opening tag with no matching close before it.
    UnclosedTag,
    /// A closing tag with no opening tag before it.
    OrphanClose,
    /// `<|channel|>analysis ... <|channel|>final<|message|>`.
    HarmonyChannel,
    /// `Thought:` / `Reasoning:` / `Pensamiento:` / `Análisis:` headers.
    PlainHeaders,
}

impl Dialect {
    pub const ORDERED: [Dialect; 6] = [
        Dialect::ThinkBlock,
        Dialect::ThoughtBlock,
        Dialect::UnclosedTag,
        Dialect::OrphanClose,
        Dialect::HarmonyChannel,
        Dialect::PlainHeaders,
    ];

    fn extract(self, text: &str) -> Option<Extraction> {
        match self {
            Dialect::ThinkBlock => extract_blocks(&THINK_BLOCK_RE, text),
            Dialect::ThoughtBlock => extract_blocks(&THOUGHT_BLOCK_RE, text),
            Dialect::UnclosedTag => extract_unclosed(text),
            Dialect::OrphanClose => extract_orphan_close(text),
            Dialect::HarmonyChannel => extract_harmony(text),
            Dialect::PlainHeaders => extract_headers(text),
        }
    }
}

fn extract_blocks(re: &Regex, text: &str) -> Option<Extraction> {
    if !re.is_match(text) {
        return None;
    }
    let mut thoughts: Vec<String> = re
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    let mut visible = re.replace_all(text, "").into_owned();
    // A later unclosed tag runs to the end of the text.
    if let Some((start, end)) = OPEN_TAG_RE.find(&visible).map(|m| (m.start(), m.end())) {
        let tail = visible[end..].trim().to_string();
        visible.truncate(start);
        if !tail.is_empty() {
            thoughts.push(tail);
        }
    }
    Some(Extraction::new(visible, thoughts.join(THOUGHT_JOINER)))
}

fn extract_unclosed(text: &str) -> Option<Extraction> {
    let open = OPEN_TAG_RE.find(text)?;
    if CLOSE_TAG_RE
        .find(text)
        .is_some_and(|c| c.start() < open.start())
    {
        return None;
    }
    let prefix = &text[..open.start()];
    let after = &text[open.end()..];
    // A close of the other tag name still ends the reasoning.
    match CLOSE_TAG_RE.find(after) {
        Some(close) => Some(Extraction::new(
            format!("{prefix}{}", &after[close.end()..]),
            &after[..close.start()],
        )),
        None => Some(Extraction::new(prefix, after)),
    }
}

fn extract_orphan_close(text: &str) -> Option<Extraction> {
    let close = CLOSE_TAG_RE.find(text)?;
    let thought = &text[..close.start()];
    let rest = &text[close.end()..];
    // Anything after a later opening tag is reasoning too.
    match OPEN_TAG_RE.find(rest) {
        Some(open) => Some(Extraction::new(
            &rest[..open.start()],
            format!("{thought}{THOUGHT_JOINER}{}", &rest[open.end()..]),
        )),
        None => Some(Extraction::new(rest, thought)),
    }
}

fn extract_harmony(text: &str) -> Option<Extraction> {
    let last_final = HARMONY_FINAL_RE.find_iter(text).last()?;
    let mut visible = &text[last_final.end()..];
    if let Some(end) = HARMONY_END_RE.find(visible) {
        visible = &visible[..end.start()];
    }
    let before = &text[..last_final.start()];
    let thoughts: Vec<&str> = HARMONY_ANALYSIS_RE
        .captures_iter(before)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .collect();
    let thought = if thoughts.is_empty() {
        PIPE_TOKEN_RE.replace_all(before, " ").trim().to_string()
    } else {
        thoughts.join(THOUGHT_JOINER)
    };
    Some(Extraction::new(visible, thought))
}

fn extract_headers(text: &str) -> Option<Extraction> {
    let open = HEADER_OPEN_RE.find(text)?;
    let mut rest = &text[open.end()..];
    let mut thoughts: Vec<&str> = Vec::new();
    let joined = |mut parts: Vec<&str>| {
        parts.retain(|p| !p.is_empty());
        parts.join(THOUGHT_JOINER)
    };
    loop {
        if let Some(resp) = RESPONSE_HEADER_RE.find(rest) {
            thoughts.push(rest[..resp.start()].trim());
            return Some(Extraction::new(&rest[resp.end()..], joined(thoughts)));
        }
        let Some(brk) = PARAGRAPH_BREAK_RE.find(rest) else {
            thoughts.push(rest.trim());
            return Some(Extraction::new("", joined(thoughts)));
        };
        thoughts.push(rest[..brk.start()].trim());
        rest = &rest[brk.end()..];
        // Each further reasoning paragraph opens with its own header.
        match HEADER_OPEN_RE.find(rest) {
            Some(next) => rest = &rest[next.end()..],
            None => return Some(Extraction::new(rest, joined(thoughts))),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Artifact cleanup
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Non-semantic debris removed from the visible text whatever dialect
/// matched. Applied in [`Artifact::ORDERED`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    /// `<｜end▁of▁sentence｜>` followed by an invented `Human:` turn.
    SentenceMarkerWithHuman,
    /// Remaining `<｜...｜>` markers.
    SentenceMarker,
    /// `<|...|>` tokens plus lowercase filler up to the next capital.
    PipeToken,
    /// Dangling or stray `<think>`/`</thought>` tags.
    StrayTag,
    /// A trailing `Human:`/`User:` line the model wrote for the other side.
    RoleLeak,
}

impl Artifact {
    pub const ORDERED: [Artifact; 5] = [
        Artifact::SentenceMarkerWithHuman,
        Artifact::SentenceMarker,
        Artifact::PipeToken,
        Artifact::StrayTag,
        Artifact::RoleLeak,
    ];

    pub fn strip(self, text: &str) -> String {
        let re: &Regex = match self {
            Artifact::SentenceMarkerWithHuman => &SENTENCE_MARKER_HUMAN_RE,
            Artifact::SentenceMarker => &SENTENCE_MARKER_RE,
            Artifact::PipeToken => &PIPE_TOKEN_FILLER_RE,
            Artifact::StrayTag => &STRAY_TAG_RE,
            Artifact::RoleLeak => &ROLE_LEAK_RE,
        };
        re.replace_all(text, "").into_owned()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Normalizer
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Ordered dialect and artifact lists. Stateless; share freely.
#[derive(Debug, Clone)]
pub struct Normalizer {
    dialects: Vec<Dialect>,
    artifacts: Vec<Artifact>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            dialects: Dialect::ORDERED.to_vec(),
            artifacts: Artifact::ORDERED.to_vec(),
        }
    }
}

impl Normalizer {
    /// A normalizer that only recognizes `dialects`, in the given order.
    pub fn with_dialects(dialects: Vec<Dialect>) -> Self {
        Self {
            dialects,
            ..Self::default()
        }
    }

    /// Never fails. Without any recognizable markup the result is the
    /// trimmed input with no thought.
    pub fn normalize(&self, raw: &str) -> Normalized {
        let text = unescape_entities(raw);

        let mut dialect = None;
        let mut extraction = None;
        for d in &self.dialects {
            if let Some(ex) = d.extract(&text) {
                dialect = Some(*d);
                extraction = Some(ex);
                break;
            }
        }
        let Extraction { visible, thought } =
            extraction.unwrap_or_else(|| Extraction::new(text.as_str(), ""));

        let visible = self
            .artifacts
            .iter()
            .fold(visible, |acc, a| a.strip(&acc));
        let visible = visible.trim();

        let thought = clean_thought(&thought);
        let thought = (!thought.is_empty()).then_some(thought);

        let visible = if visible.is_empty() && thought.is_some() {
            REASONING_ONLY_PLACEHOLDER.to_string()
        } else {
            visible.to_string()
        };

        Normalized {
            visible,
            thought,
            dialect,
        }
    }
}

/// [`Normalizer::normalize`] with the default dialect order.
pub fn normalize(raw: &str) -> Normalized {
    static DEFAULT: LazyLock<Normalizer> = LazyLock::new(Normalizer::default);
    DEFAULT.normalize(raw)
}

fn clean_thought(thought: &str) -> String {
    let t = STRAY_TAG_RE.replace_all(thought, "");
    let t = PIPE_TOKEN_RE.replace_all(&t, "");
    t.trim().to_string()
}

fn unescape_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    fn split(raw: &str) -> (String, Option<String>) {
        let n = normalize(raw);
        (n.visible, n.thought)
    }

    // ── dialects ──

    #[test]
    fn think_block() {
        let n = normalize("<think>ignore</think>Estoy cansado");
        assert_eq!(n.visible, "Estoy cansado");
        assert_eq!(n.thought.as_deref(), Some("ignore"));
        assert_eq!(n.dialect, Some(Dialect::ThinkBlock));
    }

    #[test]
    fn think_block_tolerates_case_and_whitespace() {
        let (v, t) = split("  < THINK >\n razono \n</ Think >\n\nHola, ¿cómo estás?  ");
        assert_eq!(v, "Hola, ¿cómo estás?");
        assert_eq!(t.as_deref(), Some("razono"));
    }

    #[test]
    fn multiple_think_blocks_are_joined() {
        let (v, t) = split("<think>uno</think>Hola <think>dos</think>che");
        assert_eq!(v, "Hola che");
        assert_eq!(t.as_deref(), Some("uno\n---\ndos"));
    }

    #[test]
    fn thought_block() {
        let n = normalize("<thought>evaluar motivación</thought>\nProbá con una alarma.");
        assert_eq!(n.visible, "Probá con una alarma.");
        assert_eq!(n.thought.as_deref(), Some("evaluar motivación"));
        assert_eq!(n.dialect, Some(Dialect::ThoughtBlock));
    }

    #[test]
    fn html_escaped_tags_are_recognized() {
        let (v, t) = split("&lt;think&gt;x&lt;/think&gt;Hola");
        assert_eq!(v, "Hola");
        assert_eq!(t.as_deref(), Some("x"));
    }

    #[test]
    fn unclosed_think_with_prefix() {
        let n = normalize("Hola. <think>sigo pensando");
        assert_eq!(n.visible, "Hola.");
        assert_eq!(n.thought.as_deref(), Some("sigo pensando"));
        assert_eq!(n.dialect, Some(Dialect::UnclosedTag));
    }

    #[test]
    fn unclosed_think_without_prefix_uses_placeholder() {
        let n = normalize("<think>solo razonamiento");
        assert_eq!(n.thought.as_deref(), Some("solo razonamiento"));
        assert_eq!(n.visible, REASONING_ONLY_PLACEHOLDER);
        assert!(n.is_reasoning_only());
    }

    #[test]
    fn unclosed_thought_tag() {
        let (v, t) = split("Bien.<thought>no mostrar");
        assert_eq!(v, "Bien.");
        assert_eq!(t.as_deref(), Some("no mostrar"));
    }

    #[test]
    fn mismatched_tags_still_hide_reasoning() {
        let (v, t) = split("<think>interno</thought>Visible");
        assert_eq!(v, "Visible");
        assert_eq!(t.as_deref(), Some("interno"));
    }

    #[test]
    fn orphan_close() {
        let n = normalize("razonamiento previo</think>\n\nMe cuesta acordarme.");
        assert_eq!(n.visible, "Me cuesta acordarme.");
        assert_eq!(n.thought.as_deref(), Some("razonamiento previo"));
        assert_eq!(n.dialect, Some(Dialect::OrphanClose));
    }

    #[test]
    fn harmony_channels() {
        let raw = "<|channel|>analysis<|message|>El paciente está cansado.<|end|>\
                   <|start|>assistant<|channel|>final<|message|>Gracias por contarme.<|return|>";
        let n = normalize(raw);
        assert_eq!(n.visible, "Gracias por contarme.");
        assert_eq!(n.thought.as_deref(), Some("El paciente está cansado."));
        assert_eq!(n.dialect, Some(Dialect::HarmonyChannel));
    }

    #[test]
    fn plain_headers_with_response() {
        let n = normalize("Pensamiento: tiene miedo.\nRespuesta: Entiendo, vamos de a poco.");
        assert_eq!(n.visible, "Entiendo, vamos de a poco.");
        assert_eq!(n.thought.as_deref(), Some("tiene miedo."));
        assert_eq!(n.dialect, Some(Dialect::PlainHeaders));
    }

    #[test]
    fn plain_headers_markdown_and_english() {
        let (v, t) = split("**Thought:** low motivation\n**Response:** Hola, ¿qué tal?");
        assert_eq!(v, "Hola, ¿qué tal?");
        assert_eq!(t.as_deref(), Some("low motivation"));
    }

    #[test]
    fn plain_header_accented_spanish() {
        let (v, t) = split("ANÁLISIS: capacidad baja.\nContestación: Probemos una rutina.");
        assert_eq!(v, "Probemos una rutina.");
        assert_eq!(t.as_deref(), Some("capacidad baja."));
    }

    #[test]
    fn plain_header_falls_back_to_paragraph_break() {
        let (v, t) = split("Reasoning: needs reminders\n\nPodés usar una alarma.");
        assert_eq!(v, "Podés usar una alarma.");
        assert_eq!(t.as_deref(), Some("needs reminders"));
    }

    #[test]
    fn consecutive_header_paragraphs_are_all_reasoning() {
        let (v, t) = split("Pensamiento: a\n\nAnálisis: b\n\nHola");
        assert_eq!(v, "Hola");
        assert_eq!(t.as_deref(), Some("a\n---\nb"));
        assert_eq!(normalize(&v).visible, v);
    }

    #[test]
    fn consecutive_headers_then_response() {
        let (v, t) = split("Thought: a\n\nReasoning: b\nRespuesta: Dale, lo vemos.");
        assert_eq!(v, "Dale, lo vemos.");
        let t = t.unwrap();
        assert!(t.starts_with('a'));
        assert!(t.ends_with('b'));
    }

    #[test]
    fn tags_take_precedence_over_headers() {
        let n = normalize("Thought: header\n<think>tag</think>Respuesta: Hola");
        assert_eq!(n.dialect, Some(Dialect::ThinkBlock));
        assert_eq!(n.thought.as_deref(), Some("tag"));
    }

    #[test]
    fn header_must_open_the_text() {
        let n = normalize("Hola. Mi análisis: estoy bien.");
        assert_eq!(n.dialect, None);
        assert_eq!(n.visible, "Hola. Mi análisis: estoy bien.");
    }

    // ── artifacts ──

    #[test]
    fn strips_pipe_tokens_with_filler() {
        let (v, t) = split("<|start|>assistant Hola, ¿cómo va?");
        assert_eq!(v, "Hola, ¿cómo va?");
        assert!(t.is_none());
    }

    #[test]
    fn strips_trailing_pipe_token() {
        let (v, _) = split("Gracias por contarme.<|im_end|>");
        assert_eq!(v, "Gracias por contarme.");
    }

    #[test]
    fn cuts_sentence_marker_followed_by_human() {
        let (v, _) = split("Probá con una alarma.<｜end▁of▁sentence｜>Human: ok gracias");
        assert_eq!(v, "Probá con una alarma.");
    }

    #[test]
    fn strips_lone_sentence_marker() {
        let (v, _) = split("Hola<｜end▁of▁sentence｜>");
        assert_eq!(v, "Hola");
    }

    #[test]
    fn strips_dangling_open_tag_after_block() {
        let (v, t) = split("<think>a</think>Hola <think>");
        assert_eq!(v, "Hola");
        assert_eq!(t.as_deref(), Some("a"));
    }

    #[test]
    fn unclosed_think_after_block_stays_hidden() {
        let (v, t) = split("<think>a</think>Hola. <think>creo que miente sobre las pastillas");
        assert_eq!(v, "Hola.");
        let t = t.unwrap();
        assert!(t.starts_with('a'));
        assert!(t.contains("creo que miente"));
    }

    #[test]
    fn unclosed_think_after_thought_block_stays_hidden() {
        let n = normalize("<thought>x</thought>Bien. <think>no quiero decirle que dejé la medicación");
        assert_eq!(n.dialect, Some(Dialect::ThoughtBlock));
        assert_eq!(n.visible, "Bien.");
        assert!(!n.visible.contains("medicación"));
        assert!(n.thought.unwrap().contains("dejé la medicación"));
    }

    #[test]
    fn cuts_invented_user_turn() {
        let (v, _) = split("Me parece bien.\nUser: y vos qué pensás?");
        assert_eq!(v, "Me parece bien.");
    }

    // ── contract ──

    #[test]
    fn plain_text_is_trimmed_only() {
        let n = normalize("   Estoy bien, gracias.  \n");
        assert_eq!(n.visible, "Estoy bien, gracias.");
        assert!(n.thought.is_none());
        assert!(n.dialect.is_none());
    }

    #[test]
    fn empty_think_block_yields_no_thought() {
        let n = normalize("<think>   </think>Hola");
        assert_eq!(n.visible, "Hola");
        assert!(n.thought.is_none());
    }

    #[test]
    fn empty_input_stays_empty() {
        let n = normalize("");
        assert_eq!(n.visible, "");
        assert!(n.thought.is_none());
    }

    #[test]
    fn normalizing_visible_output_is_a_no_op() {
        let inputs = [
            "<think>x</think>Estoy cansado",
            "Pensamiento: a\nRespuesta: Probá con una alarma en el celular.",
            "<|channel|>analysis<|message|>a<|end|><|start|>assistant<|channel|>final<|message|>Hola, Carlos.",
            "razono</think>¿Cómo venís con las pastillas?",
            "Gracias por contarme. Probá poner una alarma.",
        ];
        for raw in inputs {
            let first = normalize(raw);
            let second = normalize(&first.visible);
            assert_eq!(second.visible, first.visible, "input: {raw}");
            assert!(second.thought.is_none(), "input: {raw}");
        }
    }

    #[test]
    fn custom_dialect_order() {
        let n = Normalizer::with_dialects(vec![Dialect::PlainHeaders])
            .normalize("<think>x</think>Hola");
        // Tag dialect disabled: only the stray tags are stripped.
        assert_eq!(n.visible, "xHola");
        assert!(n.thought.is_none());
    }
}
