//! Fixed Hebrew prompt set and prompt assembly for the challenge modes.

use crate::models::{Message, Mode, Role};

const LOGICAL_INSTRUCTION: &str = "אתה מומחה לחשיבה לוגית ואנליטית. תפקידך להציג טיעון נגדי מבוסס היגיון, עקבי ומנומק. התמקד בחולשות לוגיות, הנחות שגויות, וקפיצות מסקנה. היה מכבד אך חד.";

const PRACTICAL_INSTRUCTION: &str = "אתה מומחה לחשיבה מעשית ומציאותית. תפקידך להציג טיעון נגדי המתמקד ביישום מעשי, מגבלות מציאותיות, ותוצאות בעולם האמיתי. הצג דוגמאות קונקרטיות ואתגרים מעשיים.";

const CONSISTENT_INSTRUCTION: &str = "אתה מומחה לזיהוי סתירות ואי-עקביות. תפקידך למצוא נקודות שבהן העמדה סותרת את עצמה, או שיש פער בין הטענה להנחות שעליה מבוססת. היה ממוקד ומדויק.";

const MINIMALIST_INSTRUCTION: &str = "אתה מומחה לשאלות חדות וממוקדות. תפקידך לשאול שאלה אחת מדויקת שמאתגרת את הליבה של העמדה. אל תסביר יותר מדי - רק שאלה אחת חזקה שגורמת למחשבה עמוקה.";

/// Response-shaping directives appended after the transcript.
const DIRECTIVES: &str = "הנחיות חשובות:
1. הצג טיעון נגדי בלבד - אל תסכים עם המשתמש
2. היה מכבד אך ישיר וחד
3. אל תחזור על מה שהמשתמש אמר
4. הצג נקודות חדשות
5. תגובתך צריכה להיות בין 2-4 פסקאות
6. כתוב בעברית";

/// Trailing cue that signals the model to begin its answer.
const ANSWER_CUE: &str = "תגובה:";

/// Trivial payload used to verify a credential against the provider.
pub const PROBE_TEXT: &str = "שלום";

impl Mode {
    pub fn instruction(&self) -> &'static str {
        match self {
            Mode::Logical => LOGICAL_INSTRUCTION,
            Mode::Practical => PRACTICAL_INSTRUCTION,
            Mode::Consistent => CONSISTENT_INSTRUCTION,
            Mode::Minimalist => MINIMALIST_INSTRUCTION,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Logical => "אתגור לוגי",
            Mode::Practical => "אתגור מעשי",
            Mode::Consistent => "אתגור עקבי",
            Mode::Minimalist => "אתגור מינימליסטי",
        }
    }
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "משתמש",
            Role::Ai => "AI",
        }
    }
}

/// Renders the full prompt for one exchange: mode instruction, transcript,
/// directives, trailing cue. Deterministic and side-effect-free.
pub fn build_prompt(mode: Mode, messages: &[Message]) -> String {
    let transcript = messages
        .iter()
        .map(|msg| format!("{}: {}", msg.role.label(), msg.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "{instruction}\n\n{transcript}\n\n{DIRECTIVES}\n\n{ANSWER_CUE}",
        instruction = mode.instruction(),
    )
}
