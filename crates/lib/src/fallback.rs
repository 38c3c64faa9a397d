//! Offline replies used when the bot API is unreachable or returns an unusable body.
//!
//! This is deliberately crude: lowercase the message, then walk an ordered list of
//! substring rules and return the first match's canned text. No tokenization, no
//! stemming. Rules overlap (a greeting can appear inside a structured prompt), so
//! order is significant.

/// Prefix of the instruction draft produced without the remote model.
pub const SIMULATION_MARKER: &str = "[РЕЖИМ СИМУЛЯЦИИ]";

/// What an incoming message is about, as far as the fallback can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    /// The structured plan-to-instruction prompt.
    InstructionDraft,
    Greeting,
    FearOfDelegating,
    ChoosingDelegate,
    Planning,
    General,
}

/// Ordered (topic, lowercase needles) rules; first match wins.
const RULES: &[(Topic, &[&str])] = &[
    (Topic::InstructionDraft, &["вводные данные:", "ты - опытный ментор"]),
    (Topic::Greeting, &["привет", "здравств"]),
    (Topic::FearOfDelegating, &["страх", "боюсь", "сам"]),
    (Topic::ChoosingDelegate, &["кому", "выбрать"]),
    (Topic::Planning, &["план", "как"]),
];

const INSTRUCTION_DRAFT_REPLY: &str = "[РЕЖИМ СИМУЛЯЦИИ]

Привет! Вот вариант поручения для вашего сотрудника:

\"Коллега, привет! У меня есть важная задача — [Название задачи].
Контекст: [Контекст из вашего плана].

Я поручаю это тебе, так как уверен в твоих навыках.
Ожидаемый результат: [Цели].
Срок: [Дедлайн].

По полномочиям: [Полномочия].
Давай сверим статус в точках контроля: [Точки контроля].

Если возникнут вопросы — я открыт для обсуждения. Удачи!\"";

const GREETING_REPLY: &str = "Здравствуйте! Я ваш AI-коуч по делегированию. Я помогу вам разобраться, какие задачи стоит передать команде, а какие оставить себе. С чего начнем?";

const FEAR_REPLY: &str = "Это распространенный барьер. Многие боятся делегировать, потому что думают, что сделают лучше сами (синдром 'Хочешь сделать хорошо - сделай сам'). Но это ведет к выгоранию. Делегирование освобождает ваше время для стратегических задач.";

const CHOOSING_REPLY: &str = "При выборе сотрудника оцените 5 факторов: уровень в иерархии (делегируйте на уровень ниже), навыки, потенциал развития, текущую загрузку и надежность. Кого из вашей команды вы рассматриваете?";

const PLANNING_REPLY: &str = "Для успешного делегирования создайте план: четко опишите задачу, установите сроки и цели, определите уровень полномочий и точки контроля. Хотите помогу составить план для конкретной задачи?";

const GENERAL_REPLY: &str = "Интересный вопрос. В контексте делегирования важно помнить: делегируйте рутину, оставляйте себе стратегию. Могу подробнее рассказать о матрице выбора задач или оценке сотрудников.";

impl Topic {
    /// Classify a message by the first rule whose needle occurs in its lowercase form.
    pub fn classify(message: &str) -> Topic {
        let lower = message.to_lowercase();
        RULES
            .iter()
            .find(|(_, needles)| needles.iter().any(|n| lower.contains(n)))
            .map(|(topic, _)| *topic)
            .unwrap_or(Topic::General)
    }

    /// Fixed reply text for this topic.
    pub fn reply(self) -> &'static str {
        match self {
            Topic::InstructionDraft => INSTRUCTION_DRAFT_REPLY,
            Topic::Greeting => GREETING_REPLY,
            Topic::FearOfDelegating => FEAR_REPLY,
            Topic::ChoosingDelegate => CHOOSING_REPLY,
            Topic::Planning => PLANNING_REPLY,
            Topic::General => GENERAL_REPLY,
        }
    }
}

/// Best-effort substitute answer for `message`. Pure and deterministic.
pub fn reply(message: &str) -> String {
    Topic::classify(message).reply().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_prompt_gets_simulated_draft() {
        let prompt = "Ты - опытный ментор и руководитель.\nВводные данные:\n1. Задача: Отчет";
        let out = reply(prompt);
        assert!(out.starts_with(SIMULATION_MARKER));
        for placeholder in [
            "[Название задачи]",
            "[Контекст из вашего плана]",
            "[Цели]",
            "[Дедлайн]",
            "[Полномочия]",
            "[Точки контроля]",
        ] {
            assert!(out.contains(placeholder), "missing {}", placeholder);
        }
    }

    #[test]
    fn either_marker_is_enough() {
        assert_eq!(Topic::classify("Вводные данные: пусто"), Topic::InstructionDraft);
        assert_eq!(Topic::classify("ТЫ - ОПЫТНЫЙ МЕНТОР"), Topic::InstructionDraft);
    }

    #[test]
    fn greeting_ignores_case_and_punctuation() {
        for msg in ["Привет", "ПРИВЕТ!!!", "ну, привет...", "Здравствуйте, коуч"] {
            assert_eq!(reply(msg), GREETING_REPLY, "{}", msg);
        }
    }

    #[test]
    fn instruction_marker_beats_greeting() {
        let msg = "Привет! Ты - опытный ментор. Вводные данные: ...";
        assert_eq!(Topic::classify(msg), Topic::InstructionDraft);
    }

    #[test]
    fn topic_rules_in_order() {
        assert_eq!(Topic::classify("Я боюсь отдавать задачи"), Topic::FearOfDelegating);
        assert_eq!(Topic::classify("Проще сделать самому"), Topic::FearOfDelegating);
        assert_eq!(Topic::classify("Кому поручить отчет?"), Topic::ChoosingDelegate);
        assert_eq!(Topic::classify("Помоги выбрать исполнителя"), Topic::ChoosingDelegate);
        assert_eq!(Topic::classify("Нужен план"), Topic::Planning);
        assert_eq!(Topic::classify("Как начать?"), Topic::Planning);
        // "боюсь" comes before "кому"
        assert_eq!(Topic::classify("боюсь, не знаю кому"), Topic::FearOfDelegating);
    }

    #[test]
    fn unmatched_gets_general_reply() {
        assert_eq!(reply("Что такое матрица Эйзенхауэра?"), GENERAL_REPLY);
        assert_eq!(reply("hello"), GENERAL_REPLY);
        assert_eq!(reply(""), GENERAL_REPLY);
    }

    #[test]
    fn reply_is_pure() {
        let msg = "Кому делегировать?";
        assert_eq!(reply(msg), reply(msg));
    }

    #[test]
    fn selection_reply_ends_with_question() {
        assert!(CHOOSING_REPLY.ends_with('?'));
        assert!(PLANNING_REPLY.ends_with('?'));
    }
}
