use uuid::Uuid;

use crate::{
    db::DbPool,
    domain::notice::{NoticeDraft, NoticeKind},
    dto::notifications::NotificationList,
    error::AppResult,
    middleware::auth::AuthUser,
    models::Notification,
    response::{ApiResponse, Meta},
};

/// Persist one notification row. Callers treat this as fire-and-forget;
/// nothing downstream of a domain write depends on it succeeding.
pub async fn emit(
    pool: &DbPool,
    recipient: Uuid,
    kind: NoticeKind,
    message: &str,
    link: Option<&str>,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO notifications (id, user_id, message, kind, link)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(recipient)
    .bind(message)
    .bind(kind.as_str())
    .bind(link)
    .execute(pool)
    .await?;

    Ok(())
}

/// Deliver a batch of drafts best-effort. A failed insert is logged and
/// dropped; it never rolls back or blocks the operation that produced it.
pub async fn emit_all(pool: &DbPool, notices: &[NoticeDraft]) {
    for notice in notices {
        if let Err(err) = emit(
            pool,
            notice.recipient,
            notice.kind,
            &notice.message,
            notice.link.as_deref(),
        )
        .await
        {
            tracing::warn!(error = %err, recipient = %notice.recipient, "notification emit failed");
        }
    }
}

/// Announce something to every follower of a store, skipping `except`
/// (the actor who caused the event). Partial failure is acceptable and
/// not retried.
pub async fn notify_followers(
    pool: &DbPool,
    store_id: Uuid,
    except: Uuid,
    kind: NoticeKind,
    message: &str,
    link: Option<&str>,
) {
    let followers: Vec<(Uuid,)> =
        match sqlx::query_as("SELECT user_id FROM store_follows WHERE store_id = $1")
            .bind(store_id)
            .fetch_all(pool)
            .await
        {
            Ok(rows) => rows,
            Err(err) => {
                tracing::warn!(error = %err, store_id = %store_id, "follower lookup failed");
                return;
            }
        };

    for (user_id,) in followers {
        if user_id == except {
            continue;
        }
        if let Err(err) = emit(pool, user_id, kind, message, link).await {
            tracing::warn!(error = %err, recipient = %user_id, "notification emit failed");
        }
    }
}

/// The recipient's notifications, newest first. Viewing the list marks
/// everything read; the returned rows still show their pre-view state.
pub async fn list_notifications(
    pool: &DbPool,
    user: &AuthUser,
) -> AppResult<ApiResponse<NotificationList>> {
    let items: Vec<Notification> = sqlx::query_as(
        "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.user_id)
    .fetch_all(pool)
    .await?;

    sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read")
        .bind(user.user_id)
        .execute(pool)
        .await?;

    Ok(ApiResponse::success(
        "Notifications",
        NotificationList { items },
        Some(Meta::empty()),
    ))
}
