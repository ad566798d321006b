//! Model-family-specific output format instructions.
//!
//! Appends to a persona prompt the reasoning-delimiter convention the target
//! model is most likely to follow, which raises the normalizer's hit rate.
//! Classification is a case-insensitive substring match over an ordered
//! fragment table; the first match wins.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    /// Reasoning-dense local models that already emit `<think>` natively.
    Reasoning,
    /// General instruction-tuned GPT-style models.
    GptStyle,
    /// Small concise instruct models.
    ConciseInstruct,
    Generic,
}

/// Checked in order. `qwen3` must precede any broader `qwen` fragment and the
/// reasoning fragments must precede `gpt` (e.g. fine-tunes named after both).
const FAMILY_FRAGMENTS: &[(&str, ModelFamily)] = &[
    ("deepseek", ModelFamily::Reasoning),
    ("-r1", ModelFamily::Reasoning),
    ("qwq", ModelFamily::Reasoning),
    ("qwen3", ModelFamily::Reasoning),
    ("mental", ModelFamily::Reasoning),
    ("psych", ModelFamily::Reasoning),
    ("gpt", ModelFamily::GptStyle),
    ("openai", ModelFamily::GptStyle),
    ("mistral", ModelFamily::ConciseInstruct),
    ("gemma", ModelFamily::ConciseInstruct),
    ("phi", ModelFamily::ConciseInstruct),
    ("llama", ModelFamily::ConciseInstruct),
    ("instruct", ModelFamily::ConciseInstruct),
];

impl ModelFamily {
    pub fn classify(model_id: &str) -> Self {
        let id = model_id.to_lowercase();
        FAMILY_FRAGMENTS
            .iter()
            .find(|(fragment, _)| id.contains(fragment))
            .map(|(_, family)| *family)
            .unwrap_or(ModelFamily::Generic)
    }

    pub fn instructions(self) -> &'static str {
        match self {
            ModelFamily::Reasoning => REASONING_BLOCK,
            ModelFamily::GptStyle => HEADERS_BLOCK,
            ModelFamily::ConciseInstruct => CONCISE_BLOCK,
            ModelFamily::Generic => GENERIC_BLOCK,
        }
    }
}

const REASONING_BLOCK: &str = "\
[FORMATO DE SALIDA - OBLIGATORIO]
- Si necesitás razonar, hacelo SIEMPRE dentro de un único bloque <think>...</think> al principio.
- Cerrá siempre la etiqueta </think> antes de escribir tu mensaje.
- Todo lo que escribas DESPUÉS de </think> es el mensaje que recibe la otra persona.
- No uses títulos, etiquetas ni comillas en el mensaje final.
Ejemplo:
<think>
[análisis interno]
</think>
[mensaje final, en texto plano]";

const HEADERS_BLOCK: &str = "\
[FORMATO DE SALIDA - OBLIGATORIO]
Respondé usando exactamente estos dos encabezados, en este orden:
Thought: [tu razonamiento interno, en una o dos oraciones]
Response: [el mensaje que recibe la otra persona, en texto plano]
No agregues nada después de la respuesta ni escribas turnos de la otra persona.";

const CONCISE_BLOCK: &str = "\
[FORMATO] Pensamiento breve dentro de <think>...</think>, después solo tu mensaje en texto plano.";

const GENERIC_BLOCK: &str = "\
[FORMATO DE SALIDA]
Si razonás antes de responder, escribí ese razonamiento dentro de <think>...</think>.
Fuera de esas etiquetas escribí únicamente tu mensaje para la otra persona.";

/// `base_prompt` followed by the format block for `model_id`'s family.
/// Never fails; unknown models get the generic block.
pub fn adapt(base_prompt: &str, model_id: &str) -> String {
    let block = ModelFamily::classify(model_id).instructions();
    let base = base_prompt.trim_end();
    if base.is_empty() {
        block.to_string()
    } else {
        format!("{base}\n\n{block}")
    }
}
