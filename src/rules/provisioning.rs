use sqlx::SqliteConnection;

use crate::config::ProvisioningConfig;
use crate::error::AppResult;
use crate::rules::consistency;
use crate::store::{entries, favorites, settings, users};
use crate::types::{Priority, User};

/// Gives a freshly inserted user a default favorite holding one sample entry, a setting
/// with default preferences, and points `default_favor` at the new favorite.
pub async fn provision_user(
    conn: &mut SqliteConnection,
    defaults: &ProvisioningConfig,
    user: &mut User,
) -> AppResult<()> {
    let favorite = favorites::insert_favorite(&mut *conn, &defaults.favorite_name, false, user.id).await?;

    let mut seed = entries::insert_entry(
        &mut *conn,
        &entries::NewEntry {
            belong: favorite.id,
            title: &defaults.seed_title,
            url: &defaults.seed_url,
            priority: Priority::Medium,
            remark: &defaults.seed_remark,
        },
    )
    .await?;
    consistency::entry_created(&mut *conn, &mut seed).await?;

    settings::insert_default_setting(&mut *conn, user.id).await?;

    users::set_default_favor(&mut *conn, user.id, Some(favorite.id)).await?;
    user.default_favor = Some(favorite.id);

    tracing::info!(
        "Provisioned user {} ({}): favorite {}, seed entry {}",
        user.username,
        user.id,
        favorite.id,
        seed.id
    );
    Ok(())
}
