// src/services/response_service.rs

use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::{AppError, Entity},
    db::{response_repo::ResponseCounts, ResponseRepository, SurveyRepository},
    models::{
        response::{
            Answer, AnswerPayload, NpsBreakdown, QuestionResult, Response, ResponseDetail, SurveyResults,
        },
        survey::{Question, QuestionType, Survey, SurveyStatus},
    },
    services::{
        access_policy::{authorize, decide, ensure_visible, Action, Actor, Resource, ResourceKind, TenantScope},
        survey_service::survey_resource,
    },
};

fn response_resource(survey: &Survey, respondent_id: Option<Uuid>) -> Resource {
    Resource::new(ResourceKind::Response, TenantScope::company(survey.company_id)).owned_by(respondent_id)
}

// --- AGREGAÇÃO ---

fn numeric(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

// Rótulos contados para perguntas de escolha
fn choice_labels(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Bool(true) => vec!["yes".into()],
        Value::Bool(false) => vec!["no".into()],
        Value::Number(n) => vec![n.to_string()],
        Value::Array(items) => items.iter().flat_map(choice_labels).collect(),
        _ => Vec::new(),
    }
}

fn one_decimal(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// NPS: promotores 9-10, neutros 7-8, detratores 0-6. Score = %promotores - %detratores.
pub fn nps_breakdown<'a>(values: impl IntoIterator<Item = &'a Value>) -> NpsBreakdown {
    let (mut promoters, mut passives, mut detractors) = (0i64, 0i64, 0i64);

    for score in values.into_iter().filter_map(numeric) {
        if score >= Decimal::from(9) {
            promoters += 1;
        } else if score >= Decimal::from(7) {
            passives += 1;
        } else {
            detractors += 1;
        }
    }

    let total = promoters + passives + detractors;
    let score = if total == 0 {
        Decimal::ZERO
    } else {
        one_decimal(Decimal::from(promoters - detractors) * Decimal::ONE_HUNDRED / Decimal::from(total))
    };

    NpsBreakdown { promoters, passives, detractors, score }
}

/// Resultados agregados por pergunta, na ordem das perguntas.
pub fn compute_results(
    survey_id: Uuid,
    questions: &[Question],
    answers: &[Answer],
    counts: ResponseCounts,
) -> SurveyResults {
    let mut by_question: HashMap<Uuid, Vec<&Value>> = HashMap::new();
    for answer in answers {
        by_question.entry(answer.question_id).or_default().push(&answer.value);
    }

    let questions = questions
        .iter()
        .map(|q| {
            let values = by_question.remove(&q.id).unwrap_or_default();
            let mut result = QuestionResult {
                question_id: q.id,
                content: q.content.clone(),
                question_type: q.question_type,
                answer_count: values.len() as i64,
                nps: None,
                average: None,
                tally: BTreeMap::new(),
            };

            match q.question_type {
                QuestionType::Nps => {
                    result.nps = Some(nps_breakdown(values.iter().copied()));
                }
                QuestionType::Rating | QuestionType::Scale => {
                    let scores: Vec<Decimal> = values.iter().filter_map(|v| numeric(v)).collect();
                    if !scores.is_empty() {
                        let sum: Decimal = scores.iter().sum();
                        result.average = Some(
                            (sum / Decimal::from(scores.len() as i64))
                                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
                        );
                    }
                }
                QuestionType::SingleChoice | QuestionType::MultipleChoice | QuestionType::YesNo => {
                    for label in values.iter().flat_map(|v| choice_labels(v)) {
                        *result.tally.entry(label).or_insert(0) += 1;
                    }
                }
                QuestionType::Text | QuestionType::Textarea | QuestionType::Date => {}
            }

            result
        })
        .collect();

    SurveyResults {
        survey_id,
        response_count: counts.total,
        completed_count: counts.completed,
        questions,
    }
}

/// Confere as respostas contra as perguntas da pesquisa.
pub fn check_answers(questions: &[Question], answers: &[AnswerPayload]) -> Result<(), AppError> {
    let by_id: HashMap<Uuid, &Question> = questions.iter().map(|q| (q.id, q)).collect();

    for answer in answers {
        let question = by_id.get(&answer.question_id).ok_or_else(|| {
            AppError::InvalidInput(format!("A pergunta {} não pertence a esta pesquisa.", answer.question_id))
        })?;
        check_value(question, &answer.value)?;
    }

    let answered: HashSet<Uuid> = answers
        .iter()
        .filter(|a| !is_blank(&a.value))
        .map(|a| a.question_id)
        .collect();

    let missing: Vec<String> = questions
        .iter()
        .filter(|q| q.is_required && !answered.contains(&q.id))
        .map(|q| q.content.clone())
        .collect();

    if !missing.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "Perguntas obrigatórias sem resposta: {}.",
            missing.join("; ")
        )));
    }

    Ok(())
}

fn check_value(question: &Question, value: &Value) -> Result<(), AppError> {
    if question.question_type == QuestionType::Nps && !is_blank(value) {
        let in_range = numeric(value)
            .is_some_and(|n| n >= Decimal::ZERO && n <= Decimal::from(10) && n.fract().is_zero());
        if !in_range {
            return Err(AppError::InvalidInput(format!(
                "A resposta NPS da pergunta {} deve ser um inteiro de 0 a 10.",
                question.id
            )));
        }
    }
    Ok(())
}

// --- SERVIÇO ---

#[derive(Clone)]
pub struct ResponseService {
    response_repo: ResponseRepository,
    survey_repo: SurveyRepository,
    pool: PgPool,
}

impl ResponseService {
    pub fn new(response_repo: ResponseRepository, survey_repo: SurveyRepository, pool: PgPool) -> Self {
        Self { response_repo, survey_repo, pool }
    }

    async fn load_survey(&self, survey_id: Uuid) -> Result<Survey, AppError> {
        self.survey_repo
            .find_by_id(&self.pool, survey_id)
            .await?
            .ok_or(AppError::NotFound(Entity::Survey))
    }

    /// Registra uma resposta completa. `actor = None` é a submissão anônima pelo link público.
    pub async fn submit_response(
        &self,
        actor: Option<&Actor>,
        survey_id: Uuid,
        answers: Vec<AnswerPayload>,
    ) -> Result<ResponseDetail, AppError> {
        let survey = self.load_survey(survey_id).await?;

        match actor {
            // Fora do alcance de resposta é NotFound; o status é conferido adiante
            Some(actor) => {
                if !decide(actor, &survey_resource(&survey), Action::Respond).is_allowed() {
                    return Err(AppError::NotFound(Entity::Survey));
                }
            }
            None if !survey.is_anonymous => {
                return Err(AppError::Forbidden("pesquisa não aceita respostas anônimas".into()));
            }
            None => {}
        }

        if survey.status != SurveyStatus::Active {
            return Err(AppError::SurveyNotAcceptingResponses);
        }

        let questions = self.survey_repo.list_questions(&self.pool, survey.id).await?;
        check_answers(&questions, &answers)?;

        let respondent_id = actor.map(|a| a.user_id);
        let anonymous_token = match actor {
            None => Some(Uuid::new_v4().to_string()),
            Some(_) => None,
        };

        let mut tx = self.pool.begin().await?;

        let response = self
            .response_repo
            .create_response(&mut *tx, survey.id, respondent_id, anonymous_token.as_deref())
            .await?;

        for answer in &answers {
            self.response_repo
                .upsert_answer(&mut *tx, response.id, answer.question_id, &answer.value)
                .await?;
        }

        let response = self.response_repo.mark_completed(&mut *tx, response.id).await?;
        let answers = self.response_repo.list_answers(&mut *tx, response.id).await?;

        tx.commit().await?;

        tracing::info!(
            survey_id = %survey.id,
            response_id = %response.id,
            anonymous = respondent_id.is_none(),
            "resposta registrada"
        );

        Ok(ResponseDetail { response, answers })
    }

    /// Grava (ou sobrescreve) a resposta atual de uma pergunta.
    pub async fn upsert_answer(
        &self,
        actor: &Actor,
        response_id: Uuid,
        question_id: Uuid,
        value: Value,
    ) -> Result<Answer, AppError> {
        let (response, survey) = self.load_response(actor, response_id).await?;
        authorize(actor, &response_resource(&survey, response.respondent_id), Action::Update)?;

        if survey.status != SurveyStatus::Active {
            return Err(AppError::SurveyNotAcceptingResponses);
        }

        let question = self
            .survey_repo
            .find_question(&self.pool, survey.id, question_id)
            .await?
            .ok_or(AppError::NotFound(Entity::Question))?;
        check_value(&question, &value)?;

        self.response_repo
            .upsert_answer(&self.pool, response.id, question.id, &value)
            .await
    }

    async fn load_response(&self, actor: &Actor, response_id: Uuid) -> Result<(Response, Survey), AppError> {
        let response = self
            .response_repo
            .find_by_id(&self.pool, response_id)
            .await?
            .ok_or(AppError::NotFound(Entity::Response))?;
        let survey = self.load_survey(response.survey_id).await?;

        ensure_visible(actor, &response_resource(&survey, response.respondent_id), Entity::Response)?;
        Ok((response, survey))
    }

    pub async fn get_response(&self, actor: &Actor, response_id: Uuid) -> Result<ResponseDetail, AppError> {
        let (response, _) = self.load_response(actor, response_id).await?;
        let answers = self.response_repo.list_answers(&self.pool, response.id).await?;
        Ok(ResponseDetail { response, answers })
    }

    // Leitura de respostas alheias: admins da empresa da pesquisa
    async fn survey_for_admin(&self, actor: &Actor, survey_id: Uuid) -> Result<Survey, AppError> {
        let survey = self.load_survey(survey_id).await?;
        ensure_visible(actor, &survey_resource(&survey), Entity::Survey)?;
        authorize(actor, &response_resource(&survey, None), Action::Read)?;
        Ok(survey)
    }

    pub async fn list_responses(&self, actor: &Actor, survey_id: Uuid) -> Result<Vec<Response>, AppError> {
        let survey = self.survey_for_admin(actor, survey_id).await?;
        self.response_repo.list_for_survey(&self.pool, survey.id).await
    }

    pub async fn survey_results(&self, actor: &Actor, survey_id: Uuid) -> Result<SurveyResults, AppError> {
        let survey = self.survey_for_admin(actor, survey_id).await?;

        let questions = self.survey_repo.list_questions(&self.pool, survey.id).await?;
        let answers = self.response_repo.list_answers_for_survey(&self.pool, survey.id).await?;
        let counts = self.response_repo.count_for_survey(&self.pool, survey.id).await?;

        Ok(compute_results(survey.id, &questions, &answers, counts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn question(question_type: QuestionType, is_required: bool) -> Question {
        Question {
            id: Uuid::new_v4(),
            survey_id: Uuid::nil(),
            question_type,
            content: format!("{:?}?", question_type),
            options: None,
            is_required,
            order_index: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn answer(question_id: Uuid, value: Value) -> Answer {
        Answer {
            id: Uuid::new_v4(),
            response_id: Uuid::new_v4(),
            question_id,
            value,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn nps_buckets_and_score() {
        let values = [json!(10), json!(9), json!(9), json!(8), json!(7), json!(3), json!("0")];
        let nps = nps_breakdown(values.iter());
        assert_eq!((nps.promoters, nps.passives, nps.detractors), (3, 2, 2));
        // (3 - 2) / 7 * 100 = 14.2857...
        assert_eq!(nps.score, Decimal::from_str("14.3").unwrap());
    }

    #[test]
    fn nps_without_answers_is_zero() {
        let nps = nps_breakdown(std::iter::empty());
        assert_eq!(nps.score, Decimal::ZERO);
        assert_eq!(nps.promoters + nps.passives + nps.detractors, 0);
    }

    #[test]
    fn results_per_question_type() {
        let nps = question(QuestionType::Nps, true);
        let rating = question(QuestionType::Rating, false);
        let choice = question(QuestionType::MultipleChoice, false);
        let text = question(QuestionType::Text, false);

        let answers = vec![
            answer(nps.id, json!(10)),
            answer(nps.id, json!(2)),
            answer(rating.id, json!(4)),
            answer(rating.id, json!(5)),
            answer(choice.id, json!(["A", "B"])),
            answer(choice.id, json!(["A"])),
            answer(text.id, json!("ok")),
        ];

        let questions = vec![nps.clone(), rating.clone(), choice.clone(), text.clone()];
        let results = compute_results(Uuid::nil(), &questions, &answers, ResponseCounts { total: 2, completed: 2 });

        assert_eq!(results.response_count, 2);
        assert_eq!(results.questions.len(), 4);
        assert_eq!(results.questions[0].nps.as_ref().unwrap().score, Decimal::ZERO);
        assert_eq!(results.questions[1].average, Some(Decimal::from_str("4.5").unwrap()));
        assert_eq!(results.questions[2].tally.get("A"), Some(&2));
        assert_eq!(results.questions[2].tally.get("B"), Some(&1));
        assert_eq!(results.questions[3].answer_count, 1);
        assert!(results.questions[3].tally.is_empty());
    }

    #[test]
    fn answers_must_belong_to_the_survey() {
        let q = question(QuestionType::Text, false);
        let stray = AnswerPayload { question_id: Uuid::new_v4(), value: json!("x") };
        assert!(matches!(check_answers(&[q], &[stray]), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn required_questions_need_a_non_blank_answer() {
        let required = question(QuestionType::Text, true);
        let blank = AnswerPayload { question_id: required.id, value: json!("  ") };
        assert!(check_answers(std::slice::from_ref(&required), &[blank]).is_err());

        let filled = AnswerPayload { question_id: required.id, value: json!("tudo certo") };
        assert!(check_answers(&[required], &[filled]).is_ok());
    }

    #[test]
    fn nps_answer_must_be_0_to_10() {
        let q = question(QuestionType::Nps, false);
        let bad = AnswerPayload { question_id: q.id, value: json!(11) };
        let good = AnswerPayload { question_id: q.id, value: json!(10) };
        assert!(check_answers(std::slice::from_ref(&q), &[bad]).is_err());
        assert!(check_answers(&[q], &[good]).is_ok());
    }

    #[test]
    fn json_looking_text_answers_stay_text() {
        let payload: AnswerPayload =
            serde_json::from_value(json!({ "questionId": Uuid::nil(), "value": "[1, 2]" })).unwrap();
        assert_eq!(payload.value, json!("[1, 2]"));

        let q = question(QuestionType::Text, true);
        let braces = AnswerPayload { question_id: q.id, value: json!("{}") };
        assert!(check_answers(&[q], &[braces]).is_ok());
    }
}
