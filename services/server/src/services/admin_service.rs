use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use log::{info, warn};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use crate::errors::ApiError;
use crate::models::lottery_model::Lottery;
use crate::models::prize_model::{GRAND_PRIZE_TYPE, ORDINARY_PRIZE_TYPE};
use crate::models::ticket_model::TicketSale;
use crate::services::{live_status, lottery_service};
use crate::types::admin_types::{
    AdminLotteryDetails, LotteryUpsertRequest, PrizeInput, Stat, StatResponse,
};
use crate::types::lottery_types::{price_to_f64, LiveStatus, LotteryShortInfo};

/// Aggregates ticket sales into admin statistics.
///
/// `sales` holds every ticket with the price of its own lottery. The active
/// lottery only counts while its event date has not passed.
pub fn compute_stat(
    users_count: i64,
    sales: &[TicketSale],
    active: Option<&Lottery>,
    now: DateTime<Utc>,
) -> Stat {
    let sold: Vec<&TicketSale> = sales.iter().filter(|t| t.owner_id.is_some()).collect();
    let tickets_earn: Decimal = sold.iter().map(|t| t.ticket_price).sum();

    let mut stat = Stat {
        users_count,
        tickets_count: sales.len() as i64,
        tickets_sold_count: sold.len() as i64,
        tickets_earn: price_to_f64(tickets_earn),
        ..Stat::default()
    };

    if let Some(lottery) = active.filter(|l| l.event_date >= now) {
        let in_lottery = sales.iter().filter(|t| t.lottery_id == lottery.id);
        let participants: HashSet<i64> = in_lottery.clone().filter_map(|t| t.owner_id).collect();
        let sold_count = in_lottery.clone().filter(|t| t.owner_id.is_some()).count() as i64;

        stat.active_lottery_participants = participants.len() as i64;
        stat.active_lottery_sold_tickets_count = sold_count;
        stat.active_lottery_tickets_count = in_lottery.count() as i64;
        stat.active_lottery_tickets_earn =
            price_to_f64(lottery.ticket_price * Decimal::from(sold_count));
    }

    stat
}

pub async fn get_admin_statistics(pool: &PgPool) -> Result<StatResponse, ApiError> {
    let now = Utc::now();

    let users_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    let sales = sqlx::query_as::<_, TicketSale>(
        "SELECT t.lottery_id, t.owner_id, l.ticket_price \
         FROM tickets t JOIN lotteries l ON l.id = t.lottery_id",
    )
    .fetch_all(pool)
    .await?;

    let active = lottery_service::get_active_lottery(pool)
        .await?
        .filter(|l| l.event_date >= now);
    let live_link = live_status::get_live_link(pool).await?;

    Ok(StatResponse {
        active_lottery: active.as_ref().map(LotteryShortInfo::from),
        live_status: LiveStatus::from_link(live_link.as_deref()),
        stat: compute_stat(users_count, &sales, active.as_ref(), now),
    })
}

fn event_date(timestamp: i64) -> Result<DateTime<Utc>, ApiError> {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .ok_or_else(|| ApiError::bad_request("Invalid event date"))
}

fn ticket_price(price: f64) -> Result<Decimal, ApiError> {
    Decimal::try_from(price)
        .map(|p| p.round_dp(2))
        .map_err(|_| ApiError::bad_request("Invalid ticket price"))
}

async fn insert_prizes(
    tx: &mut Transaction<'_, Postgres>,
    lottery_id: i64,
    prizes: &[PrizeInput],
    prize_type: &str,
) -> Result<(), sqlx::Error> {
    for prize in prizes {
        let prize_id: i64 = sqlx::query_scalar(
            "INSERT INTO prizes (title, type, description, quantity, image) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(&prize.title)
        .bind(prize_type)
        .bind(&prize.description)
        .bind(prize.quantity)
        .bind(&prize.image)
        .fetch_one(&mut **tx)
        .await?;

        sqlx::query("INSERT INTO lottery_prizes (lottery_id, prize_id) VALUES ($1, $2)")
            .bind(lottery_id)
            .bind(prize_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

/// Drops the lottery's prizes of one kind. Refused once any of them has
/// been awarded, since deleting a prize also deletes its awards.
async fn remove_prizes(
    tx: &mut Transaction<'_, Postgres>,
    lottery_id: i64,
    grand: bool,
) -> Result<(), ApiError> {
    let awarded: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM user_prizes up
        JOIN lottery_prizes lp ON lp.prize_id = up.prize_id
        JOIN prizes p ON p.id = up.prize_id
        WHERE lp.lottery_id = $1 AND (p.type = $2) = $3
        "#,
    )
    .bind(lottery_id)
    .bind(GRAND_PRIZE_TYPE)
    .bind(grand)
    .fetch_one(&mut **tx)
    .await?;

    if awarded > 0 {
        warn!(
            "Refusing to replace prizes of lottery {}: {} already awarded",
            lottery_id, awarded
        );
        return Err(ApiError::bad_request("Awarded prizes cannot be replaced"));
    }

    sqlx::query(
        r#"
        DELETE FROM prizes
        WHERE id IN (
            SELECT lp.prize_id FROM lottery_prizes lp
            JOIN prizes p ON p.id = lp.prize_id
            WHERE lp.lottery_id = $1 AND (p.type = $2) = $3
        )
        "#,
    )
    .bind(lottery_id)
    .bind(GRAND_PRIZE_TYPE)
    .bind(grand)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn create_lottery(pool: &PgPool, req: &LotteryUpsertRequest) -> Result<Lottery, ApiError> {
    let event_date = event_date(req.event_date)?;
    let price = ticket_price(req.ticket_price)?;

    let mut tx = pool.begin().await?;

    let lottery_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO lotteries (name, banner, collection_banner, short_description, total_sum,
                               event_date, collection_name, collection_address, collection_chain,
                               ticket_template, ticket_price)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING id
        "#,
    )
    .bind(&req.name)
    .bind(&req.banner)
    .bind(&req.collection_banner)
    .bind(&req.short_description)
    .bind(req.total_sum)
    .bind(event_date)
    .bind(&req.collection_name)
    .bind(&req.collection_address)
    .bind(&req.collection_chain)
    .bind(&req.ticket_template)
    .bind(price)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(grand) = &req.grand_prizes {
        insert_prizes(&mut tx, lottery_id, grand, GRAND_PRIZE_TYPE).await?;
    }
    if let Some(prizes) = &req.prizes {
        insert_prizes(&mut tx, lottery_id, prizes, ORDINARY_PRIZE_TYPE).await?;
    }

    tx.commit().await?;
    info!("Lottery {} created", lottery_id);

    lottery_service::get_lottery(pool, lottery_id).await
}

/// Overwrites a lottery's fields. A supplied prize list replaces the
/// lottery's prizes of that kind; an absent one leaves them untouched.
/// Replacing a kind with awarded prizes fails with 400 and changes nothing.
pub async fn update_lottery(
    pool: &PgPool,
    lottery_id: i64,
    req: &LotteryUpsertRequest,
) -> Result<Lottery, ApiError> {
    let event_date = event_date(req.event_date)?;
    let price = ticket_price(req.ticket_price)?;

    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        r#"
        UPDATE lotteries
        SET name = $1, banner = $2, collection_banner = $3, short_description = $4,
            total_sum = $5, event_date = $6, collection_name = $7, collection_address = $8,
            collection_chain = $9, ticket_template = $10, ticket_price = $11
        WHERE id = $12
        "#,
    )
    .bind(&req.name)
    .bind(&req.banner)
    .bind(&req.collection_banner)
    .bind(&req.short_description)
    .bind(req.total_sum)
    .bind(event_date)
    .bind(&req.collection_name)
    .bind(&req.collection_address)
    .bind(&req.collection_chain)
    .bind(&req.ticket_template)
    .bind(price)
    .bind(lottery_id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(ApiError::not_found("Lottery not found"));
    }

    if let Some(grand) = &req.grand_prizes {
        remove_prizes(&mut tx, lottery_id, true).await?;
        insert_prizes(&mut tx, lottery_id, grand, GRAND_PRIZE_TYPE).await?;
    }
    if let Some(prizes) = &req.prizes {
        remove_prizes(&mut tx, lottery_id, false).await?;
        insert_prizes(&mut tx, lottery_id, prizes, ORDINARY_PRIZE_TYPE).await?;
    }

    tx.commit().await?;
    info!("Lottery {} updated", lottery_id);

    lottery_service::get_lottery(pool, lottery_id).await
}

/// Deletes a lottery with its tickets and prizes.
pub async fn delete_lottery(pool: &PgPool, lottery_id: i64) -> Result<(), ApiError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "DELETE FROM prizes WHERE id IN (SELECT prize_id FROM lottery_prizes WHERE lottery_id = $1)",
    )
    .bind(lottery_id)
    .execute(&mut *tx)
    .await?;

    let deleted = sqlx::query("DELETE FROM lotteries WHERE id = $1")
        .bind(lottery_id)
        .execute(&mut *tx)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(ApiError::not_found("Lottery not found"));
    }

    tx.commit().await?;
    info!("Lottery {} deleted", lottery_id);
    Ok(())
}

pub async fn get_lottery_details(pool: &PgPool, lottery_id: i64) -> Result<AdminLotteryDetails, ApiError> {
    let lottery = lottery_service::get_lottery(pool, lottery_id).await?;

    let (tickets_count, sold_tickets_count): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(owner_id) FROM tickets WHERE lottery_id = $1",
    )
    .bind(lottery_id)
    .fetch_one(pool)
    .await?;

    let slots = lottery_service::get_prize_slots(pool, lottery_id).await?;
    let board = lottery_service::get_prize_board(pool, lottery_id).await?;

    Ok(AdminLotteryDetails {
        id: lottery.id,
        name: lottery.name,
        short_description: lottery.short_description,
        banner: lottery.banner,
        collection_banner: lottery.collection_banner,
        event_date: lottery.event_date.timestamp(),
        is_active: lottery.is_active,
        total_sum: lottery.total_sum,
        ticket_price: price_to_f64(lottery.ticket_price),
        collection_name: lottery.collection_name,
        collection_address: lottery.collection_address,
        collection_chain: lottery.collection_chain,
        ticket_template: lottery.ticket_template,
        tickets_count,
        sold_tickets_count,
        available_nft_count: slots.available(),
        total_nft_count: slots.total_slots,
        board,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::lottery_service::tests::lottery;
    use chrono::Duration;

    fn sale(lottery_id: i64, owner_id: Option<i64>, price: i64) -> TicketSale {
        TicketSale {
            lottery_id,
            owner_id,
            ticket_price: Decimal::new(price, 0),
        }
    }

    #[test]
    fn empty_database_is_all_zero() {
        let stat = compute_stat(0, &[], None, Utc::now());
        assert_eq!(stat, Stat::default());
    }

    #[test]
    fn revenue_uses_each_tickets_own_price() {
        let sales = vec![
            sale(1, Some(10), 5),
            sale(1, None, 5),
            sale(2, Some(11), 20),
            sale(2, Some(10), 20),
        ];
        let stat = compute_stat(3, &sales, None, Utc::now());

        assert_eq!(stat.users_count, 3);
        assert_eq!(stat.tickets_count, 4);
        assert_eq!(stat.tickets_sold_count, 3);
        assert_eq!(stat.tickets_earn, 45.0);
        assert_eq!(stat.active_lottery_tickets_count, 0);
    }

    #[test]
    fn active_lottery_breakdown() {
        let now = Utc::now();
        let mut active = lottery(2, true, now + Duration::days(1));
        active.ticket_price = Decimal::new(2050, 2);

        let sales = vec![
            sale(1, Some(10), 5),
            sale(2, Some(10), 20),
            sale(2, Some(10), 20),
            sale(2, Some(11), 20),
            sale(2, None, 20),
        ];
        let stat = compute_stat(2, &sales, Some(&active), now);

        assert_eq!(stat.active_lottery_participants, 2);
        assert_eq!(stat.active_lottery_sold_tickets_count, 3);
        assert_eq!(stat.active_lottery_tickets_count, 4);
        assert_eq!(stat.active_lottery_tickets_earn, 61.5);
    }

    #[test]
    fn finished_active_lottery_is_ignored() {
        let now = Utc::now();
        let past = lottery(1, true, now - Duration::hours(1));
        let stat = compute_stat(1, &[sale(1, Some(10), 5)], Some(&past), now);

        assert_eq!(stat.tickets_sold_count, 1);
        assert_eq!(stat.active_lottery_participants, 0);
        assert_eq!(stat.active_lottery_tickets_earn, 0.0);
    }

    #[test]
    fn event_date_and_price_conversion() {
        assert_eq!(event_date(1_700_000_000).unwrap().timestamp(), 1_700_000_000);
        assert_eq!(ticket_price(19.999).unwrap(), Decimal::new(2000, 2));
        assert!(ticket_price(f64::NAN).is_err());
    }
}
