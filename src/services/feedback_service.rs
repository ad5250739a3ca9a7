//! Feedback intake: store the document and queue a notification email.

use tracing::warn;

use crate::{
    dao::feedback::{EmailDocument, FeedbackDocument},
    dto::{feedback::FeedbackRequest, format_epoch_ms, validation::validate_room_code},
    error::ServiceError,
    state::{SharedState, epoch_ms},
};

/// Address feedback notifications are sent to.
const FEEDBACK_RECIPIENT: &str = "feedback@planning-poker.invalid";

/// Persist a feedback submission and queue the notification email.
///
/// The email is best-effort; feedback is acknowledged as soon as the document
/// itself is stored.
pub async fn submit(state: &SharedState, request: FeedbackRequest) -> Result<(), ServiceError> {
    if let Some(code) = request.room_code.as_deref() {
        validate_room_code(code)
            .map_err(|_| ServiceError::InvalidInput(format!("invalid room code `{code}`")))?;
    }

    let sink = state.feedback();
    let submitted_at = format_epoch_ms(epoch_ms());
    let message = request.message.trim().to_owned();

    sink.submit_feedback(FeedbackDocument {
        message: message.clone(),
        category: request.category.clone(),
        email: request.email.clone(),
        room_code: request.room_code.clone(),
        submitted_at: submitted_at.clone(),
    })
    .await?;

    let body = render_email_body(&message, &request, &submitted_at);
    if let Err(err) = sink
        .queue_email(EmailDocument {
            to: FEEDBACK_RECIPIENT.to_owned(),
            subject: format!(
                "New feedback: {}",
                request.category.as_deref().unwrap_or("general")
            ),
            body,
            queued_at: submitted_at,
        })
        .await
    {
        warn!(error = %err, "failed to queue feedback email");
    }

    Ok(())
}

fn render_email_body(message: &str, request: &FeedbackRequest, submitted_at: &str) -> String {
    let mut body = format!("Feedback received at {submitted_at}\n\n{message}\n");
    if let Some(category) = request.category.as_deref() {
        body.push_str(&format!("\nCategory: {category}"));
    }
    if let Some(email) = request.email.as_deref() {
        body.push_str(&format!("\nReply to: {email}"));
    }
    if let Some(code) = request.room_code.as_deref() {
        body.push_str(&format!("\nRoom: {code}"));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, dao::feedback::MemoryFeedbackSink, state::AppState};
    use std::sync::Arc;

    #[tokio::test]
    async fn feedback_is_stored_and_an_email_is_queued() {
        let sink = MemoryFeedbackSink::new();
        let state = AppState::with_backends(
            AppConfig::default(),
            Arc::new(crate::dao::room_store::memory::MemoryRoomStore::default()),
            Arc::new(sink.clone()),
        );

        submit(
            &state,
            FeedbackRequest {
                message: "  Great tool!  ".into(),
                category: Some("idea".into()),
                email: None,
                room_code: Some("ABC123".into()),
            },
        )
        .await
        .unwrap();

        let feedback = sink.drain_feedback().await;
        assert_eq!(feedback.len(), 1);
        assert_eq!(feedback[0].message, "Great tool!");

        let emails = sink.drain_emails().await;
        assert_eq!(emails.len(), 1);
        assert!(emails[0].subject.contains("idea"));
        assert!(emails[0].body.contains("Room: ABC123"));
    }

    #[tokio::test]
    async fn malformed_room_codes_are_rejected() {
        let state = AppState::new(AppConfig::default());
        let err = submit(
            &state,
            FeedbackRequest {
                message: "hello".into(),
                category: None,
                email: None,
                room_code: Some("abc".into()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}
