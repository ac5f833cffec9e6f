//! # Notifications
//!
//! Quiz results are mailed to the Academy commission through the Resend HTTP
//! API.
//!
//! Delivery is best effort. A missing API key, a network failure or a non 2xx
//! answer is logged and reported as `false`, never as an error, and the quiz
//! handler runs it on its own task so the submission never waits on it.
use std::time::Duration;

use chrono::{DateTime, Utc};
use quiz::{QuizAnswer, QuizResult};
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{config::Config, models::User};

pub const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

#[derive(Debug, Serialize)]
pub struct Email {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

pub struct Notifier {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
    sender: String,
    recipient: String,
}

impl Notifier {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {e}");
                Client::new()
            });

        if config.resend_api_key.is_none() {
            warn!("RESEND_API_KEY not set, quiz emails are disabled");
        }

        Self {
            client,
            api_key: config.resend_api_key.clone(),
            endpoint: config.resend_url.clone(),
            sender: config.sender_email.clone(),
            recipient: config.recipient_email.clone(),
        }
    }

    pub fn quiz_email(&self, user: &User, answers: &[QuizAnswer], result: &QuizResult) -> Email {
        Email {
            from: self.sender.clone(),
            to: vec![self.recipient.clone()],
            subject: format!(
                "Risultato Questionario - {} - {}",
                user.username, result.profile_name
            ),
            html: render_quiz_email(user, answers, result, Utc::now()),
        }
    }

    pub async fn send_quiz_result(&self, user: &User, answers: &[QuizAnswer], result: &QuizResult) -> bool {
        let Some(api_key) = &self.api_key else {
            info!("Skipping quiz email for {}, no API key", user.username);
            return false;
        };

        let email = self.quiz_email(user, answers, result);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&email)
            .send()
            .await;

        match response {
            Ok(res) if res.status().is_success() => {
                info!("Email sent successfully for {}", user.username);
                true
            }
            Ok(res) => {
                let status = res.status();
                let body = res.text().await.unwrap_or_default();
                error!("Failed to send email: {status} {body}");
                false
            }
            Err(e) => {
                error!("Failed to send email: {e}");
                false
            }
        }
    }
}

pub fn render_answers(answers: &[QuizAnswer]) -> String {
    let mut sorted: Vec<&QuizAnswer> = answers.iter().collect();
    sorted.sort_by_key(|answer| answer.question_number);

    sorted
        .iter()
        .map(|answer| {
            format!(
                "<li>Domanda {} - Risposta {}</li>",
                answer.question_number,
                escape(&answer.answer.to_uppercase())
            )
        })
        .collect()
}

pub fn render_quiz_email(
    user: &User,
    answers: &[QuizAnswer],
    result: &QuizResult,
    sent_at: DateTime<Utc>,
) -> String {
    format!(
        r#"<div style="font-family: Georgia, serif; max-width: 600px; margin: 0 auto; padding: 20px; background-color: #FDFBF7; border: 3px double #D4AF37;">
    <h1 style="color: #2C3E50; text-align: center; font-size: 24px;">Risultati del Questionario</h1>
    <h2 style="color: #2C3E50; text-align: center; font-size: 18px;">Accademia Pokémon</h2>
    <hr style="border: 1px solid #D4AF37; margin: 20px 0;">
    <p><strong>Allenatore:</strong> {username}</p>
    <p><strong>Email:</strong> {email}</p>
    <p><strong>Data:</strong> {date}</p>
    <h3 style="color: #2C3E50; margin-top: 20px;">Risposte:</h3>
    <ul style="list-style-type: none; padding: 0;">{answers}</ul>
    <hr style="border: 1px solid #D4AF37; margin: 20px 0;">
    <h3 style="color: #8E44AD; text-align: center;">{name}</h3>
    <h4 style="color: #C0392B; text-align: center;">{kind}</h4>
    <p style="text-align: center; font-style: italic; color: #2C3E50;">{description}</p>
    <div style="text-align: center; margin-top: 30px; color: #8E44AD;">
        <p style="font-size: 12px;">Documento ufficiale dell'Accademia Pokémon</p>
    </div>
</div>"#,
        username = escape(&user.username),
        email = escape(&user.email),
        date = sent_at.format("%d/%m/%Y %H:%M"),
        answers = render_answers(answers),
        name = result.profile_name,
        kind = result.profile_type,
        description = result.description,
    )
}

fn escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
