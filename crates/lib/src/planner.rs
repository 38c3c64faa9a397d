//! Delegation plan → instruction text.
//!
//! The plan is rendered into a fixed structured prompt and sent as a single
//! one-shot exchange on a fresh `planner_*` conversation.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::messaging::MessagingClient;
use crate::session::{exchange, BusyGuard, ConversationId, ConversationTurn, Surface};

/// How much decision power the delegate gets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorityLevel {
    /// Full authority: act on your own.
    All,
    /// Partial: decisions need sign-off.
    Some,
    /// Execution only.
    None,
    #[default]
    #[serde(rename = "")]
    Unset,
}

impl std::str::FromStr for AuthorityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(AuthorityLevel::All),
            "some" => Ok(AuthorityLevel::Some),
            "none" => Ok(AuthorityLevel::None),
            "" => Ok(AuthorityLevel::Unset),
            other => Err(format!("unknown authority level: {} (expected all, some or none)", other)),
        }
    }
}

impl AuthorityLevel {
    fn describe(self) -> &'static str {
        match self {
            AuthorityLevel::None => "Нет (только исполнение)",
            AuthorityLevel::Some => "Частичные (согласование решений)",
            AuthorityLevel::All => "Полные (действуй сам)",
            AuthorityLevel::Unset => "Не указаны",
        }
    }
}

/// A delegation plan as filled in by the manager. Every field may be left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DelegationPlan {
    pub task_name: String,
    /// Why the task matters (context).
    pub purpose: String,
    pub deadline: String,
    /// Expected result / KPI.
    pub goals: String,
    pub responsible_person: String,
    pub authority_level: AuthorityLevel,
    pub checkpoints: String,
}

/// Only an empty field gets the placeholder; whitespace is passed through as typed.
fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.is_empty() {
        placeholder
    } else {
        value
    }
}

/// Render the instruction-generation prompt for `plan`.
pub fn instruction_prompt(plan: &DelegationPlan) -> String {
    format!(
        "Ты - опытный ментор и руководитель. Твоя задача - сформулировать готовый текст поручения (устного или письменного) для сотрудника на основе плана делегирования.

Вводные данные:
1. Задача: {task}
2. Контекст (Зачем): {purpose}
3. Сотрудник: {person}
4. Срок: {deadline}
5. Результат (KPI): {goals}
6. Полномочия: {authority}
7. Контроль: {checkpoints}

Напиши текст обращения к сотруднику. Структура:
- Приветствие и мотивационная часть (почему это важно).
- Суть задачи и ожидаемый результат.
- Обозначение сроков и точек контроля.
- Уточнение полномочий и готовность помочь.

Тон: Профессиональный, поддерживающий, четкий.
",
        task = or_placeholder(&plan.task_name, "Не указана"),
        purpose = or_placeholder(&plan.purpose, "Не указан"),
        person = or_placeholder(&plan.responsible_person, "Сотрудник"),
        deadline = or_placeholder(&plan.deadline, "Не указан"),
        goals = or_placeholder(&plan.goals, "Не указаны"),
        authority = plan.authority_level.describe(),
        checkpoints = or_placeholder(&plan.checkpoints, "Не указан"),
    )
}

/// One-shot planner surface: each generation is a single exchange on a new conversation.
pub struct InstructionGenerator {
    client: Arc<dyn MessagingClient>,
    busy: Arc<AtomicBool>,
}

impl InstructionGenerator {
    pub fn new(client: Arc<dyn MessagingClient>) -> Self {
        Self {
            client,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Generate the instruction text for `plan`. None when a generation is already running.
    pub async fn generate(&self, plan: &DelegationPlan) -> Option<ConversationTurn> {
        self.send(&instruction_prompt(plan)).await
    }

    /// Send an already rendered prompt as a one-shot exchange.
    pub async fn send(&self, prompt: &str) -> Option<ConversationTurn> {
        if prompt.trim().is_empty() {
            return None;
        }
        let _busy = BusyGuard::acquire(&self.busy)?;
        let surface = Surface::Planner;
        let id = ConversationId::generate(surface.namespace());
        log::debug!("planner: generating instruction on chat {}", id);
        let reply = exchange(self.client.as_ref(), surface, &id, prompt).await;
        Some(ConversationTurn::assistant(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::{self, Topic};

    #[test]
    fn prompt_contains_plan_fields() {
        let plan = DelegationPlan {
            task_name: "Отчет".to_string(),
            purpose: "Квартальные итоги".to_string(),
            deadline: "2026-11-01".to_string(),
            goals: "Готовый отчет".to_string(),
            responsible_person: "Анна".to_string(),
            authority_level: AuthorityLevel::Some,
            checkpoints: "Каждый понедельник".to_string(),
        };
        let prompt = instruction_prompt(&plan);
        assert!(prompt.contains("1. Задача: Отчет\n"));
        assert!(prompt.contains("2. Контекст (Зачем): Квартальные итоги\n"));
        assert!(prompt.contains("3. Сотрудник: Анна\n"));
        assert!(prompt.contains("4. Срок: 2026-11-01\n"));
        assert!(prompt.contains("5. Результат (KPI): Готовый отчет\n"));
        assert!(prompt.contains("6. Полномочия: Частичные (согласование решений)\n"));
        assert!(prompt.contains("7. Контроль: Каждый понедельник\n"));
    }

    #[test]
    fn empty_plan_uses_placeholders() {
        let prompt = instruction_prompt(&DelegationPlan::default());
        assert!(prompt.contains("1. Задача: Не указана\n"));
        assert!(prompt.contains("3. Сотрудник: Сотрудник\n"));
        assert!(prompt.contains("5. Результат (KPI): Не указаны\n"));
        assert!(prompt.contains("6. Полномочия: Не указаны\n"));
    }

    #[test]
    fn whitespace_field_is_kept_as_typed() {
        let prompt = instruction_prompt(&DelegationPlan {
            task_name: "  ".to_string(),
            ..Default::default()
        });
        assert!(prompt.contains("1. Задача:   \n"));
        assert!(!prompt.contains("Не указана"));
    }

    #[test]
    fn prompt_is_recognized_by_fallback() {
        let prompt = instruction_prompt(&DelegationPlan {
            task_name: "Привет".to_string(),
            ..Default::default()
        });
        assert_eq!(Topic::classify(&prompt), Topic::InstructionDraft);
        assert!(fallback::reply(&prompt).starts_with(fallback::SIMULATION_MARKER));
    }

    #[test]
    fn authority_level_from_str() {
        assert_eq!("ALL".parse::<AuthorityLevel>(), Ok(AuthorityLevel::All));
        assert_eq!("some".parse::<AuthorityLevel>(), Ok(AuthorityLevel::Some));
        assert_eq!(" none ".parse::<AuthorityLevel>(), Ok(AuthorityLevel::None));
        assert!("maybe".parse::<AuthorityLevel>().is_err());
    }

    #[test]
    fn plan_json_uses_camel_case_and_empty_authority() {
        let plan: DelegationPlan = serde_json::from_str(
            r#"{"taskName":"Отчет","authorityLevel":"All","responsiblePerson":"Иван"}"#,
        )
        .unwrap();
        assert_eq!(plan.task_name, "Отчет");
        assert_eq!(plan.authority_level, AuthorityLevel::All);
        assert_eq!(plan.responsible_person, "Иван");
        assert!(plan.deadline.is_empty());

        let unset: DelegationPlan = serde_json::from_str(r#"{"authorityLevel":""}"#).unwrap();
        assert_eq!(unset.authority_level, AuthorityLevel::Unset);
    }
}
