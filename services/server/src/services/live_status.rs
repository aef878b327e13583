use log::info;
use sqlx::PgPool;

use crate::models::option_model::{AppOption, LIVE_LINK_KEY};

pub async fn get_live_link(pool: &PgPool) -> Result<Option<String>, sqlx::Error> {
    let option = sqlx::query_as::<_, AppOption>("SELECT id, title, key, value FROM options WHERE key = $1")
        .bind(LIVE_LINK_KEY)
        .fetch_optional(pool)
        .await?;
    Ok(option.map(|o| o.value))
}

/// Stores the live-stream link. An empty link takes the stream offline.
pub async fn set_live_link(pool: &PgPool, link: &str) -> Result<(), sqlx::Error> {
    let link = link.trim();
    if link.is_empty() {
        sqlx::query("DELETE FROM options WHERE key = $1")
            .bind(LIVE_LINK_KEY)
            .execute(pool)
            .await?;
        info!("Live stream link cleared");
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO options (title, key, value)
        VALUES ('Live stream link', $1, $2)
        ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
        "#,
    )
    .bind(LIVE_LINK_KEY)
    .bind(link)
    .execute(pool)
    .await?;
    info!("Live stream link set to {}", link);
    Ok(())
}
