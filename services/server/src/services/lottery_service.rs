use chrono::{DateTime, Utc};
use log::info;
use sqlx::{FromRow, PgPool};

use crate::errors::ApiError;
use crate::models::lottery_model::{Lottery, LotteryWithTicketCount};
use crate::models::prize_model::{Prize, PrizeWinner};
use crate::models::ticket_model::Ticket;
use crate::types::lottery_types::{
    price_to_f64, FullLotteryInfo, LotteryInfo, PrizeBoard, PrizeInfo, WinnerItem,
};
use crate::types::user_types::ShortUser;
use crate::utils::pagination::Page;

pub const LOTTERY_COLUMNS: &str = "id, name, banner, collection_banner, short_description, total_sum, \
    event_date, is_active, collection_name, collection_address, collection_chain, ticket_template, \
    ticket_price, created_at";

const LOTTERY_WITH_COUNT_SELECT: &str = "SELECT l.id, l.name, l.banner, l.collection_banner, \
    l.short_description, l.event_date, l.is_active, l.ticket_price, \
    (SELECT COUNT(*) FROM tickets t WHERE t.lottery_id = l.id) AS ticket_count \
    FROM lotteries l";

/// Prize slots of one lottery and how many of them have been awarded.
#[derive(FromRow, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrizeSlots {
    pub total_slots: i64,
    pub claimed_slots: i64,
}

impl PrizeSlots {
    /// Remaining slots. Not clamped: more claims than slots yields a
    /// negative number.
    pub fn available(&self) -> i64 {
        self.total_slots - self.claimed_slots
    }
}

pub async fn get_prize_slots(pool: &PgPool, lottery_id: i64) -> Result<PrizeSlots, sqlx::Error> {
    sqlx::query_as::<_, PrizeSlots>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM lottery_prizes WHERE lottery_id = $1) AS total_slots,
            (SELECT COUNT(*) FROM user_prizes
             WHERE prize_id IN (SELECT prize_id FROM lottery_prizes WHERE lottery_id = $1)) AS claimed_slots
        "#,
    )
    .bind(lottery_id)
    .fetch_one(pool)
    .await
}

pub async fn get_available_nft_count(pool: &PgPool, lottery_id: i64) -> Result<i64, sqlx::Error> {
    Ok(get_prize_slots(pool, lottery_id).await?.available())
}

pub async fn get_total_nft_count(pool: &PgPool, lottery_id: i64) -> Result<i64, sqlx::Error> {
    Ok(get_prize_slots(pool, lottery_id).await?.total_slots)
}

pub async fn find_lottery(pool: &PgPool, lottery_id: i64) -> Result<Option<Lottery>, sqlx::Error> {
    sqlx::query_as::<_, Lottery>(&format!(
        "SELECT {} FROM lotteries WHERE id = $1",
        LOTTERY_COLUMNS
    ))
    .bind(lottery_id)
    .fetch_optional(pool)
    .await
}

pub async fn get_lottery(pool: &PgPool, lottery_id: i64) -> Result<Lottery, ApiError> {
    find_lottery(pool, lottery_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lottery not found"))
}

pub async fn get_active_lottery(pool: &PgPool) -> Result<Option<Lottery>, sqlx::Error> {
    sqlx::query_as::<_, Lottery>(&format!(
        "SELECT {} FROM lotteries WHERE is_active = TRUE ORDER BY event_date LIMIT 1",
        LOTTERY_COLUMNS
    ))
    .fetch_optional(pool)
    .await
}

/// Lotteries whose event date is at or after `now`, soonest first.
pub async fn get_upcoming_lotteries(
    pool: &PgPool,
    now: DateTime<Utc>,
) -> Result<Vec<Lottery>, sqlx::Error> {
    sqlx::query_as::<_, Lottery>(&format!(
        "SELECT {} FROM lotteries WHERE event_date >= $1 ORDER BY event_date ASC, id ASC",
        LOTTERY_COLUMNS
    ))
    .bind(now)
    .fetch_all(pool)
    .await
}

/// Separates the active lottery from the others, keeping their order.
pub fn split_active(lotteries: Vec<Lottery>) -> (Option<Lottery>, Vec<Lottery>) {
    let mut active = None;
    let mut rest = Vec::with_capacity(lotteries.len());
    for lottery in lotteries {
        if lottery.is_active && active.is_none() {
            active = Some(lottery);
        } else if !lottery.is_active {
            rest.push(lottery);
        }
    }
    (active, rest)
}

/// Marks `lottery_id` active and every other lottery inactive in one statement.
pub async fn set_active_lottery(pool: &PgPool, lottery_id: i64) -> Result<Lottery, ApiError> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM lotteries WHERE id = $1")
        .bind(lottery_id)
        .fetch_optional(pool)
        .await?;
    if exists.is_none() {
        return Err(ApiError::not_found("Lottery not found"));
    }

    sqlx::query("UPDATE lotteries SET is_active = (id = $1)")
        .bind(lottery_id)
        .execute(pool)
        .await?;

    info!("Lottery {} set as active", lottery_id);
    get_lottery(pool, lottery_id).await
}

/// Past lotteries that are not active, newest first.
pub async fn get_lottery_history(
    pool: &PgPool,
    now: DateTime<Utc>,
    page: Page,
) -> Result<(Vec<LotteryWithTicketCount>, i64), sqlx::Error> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM lotteries WHERE event_date < $1 AND is_active = FALSE",
    )
    .bind(now)
    .fetch_one(pool)
    .await?;

    let lotteries = sqlx::query_as::<_, LotteryWithTicketCount>(&format!(
        "{} WHERE l.event_date < $1 AND l.is_active = FALSE \
         ORDER BY l.event_date DESC, l.id DESC LIMIT $2 OFFSET $3",
        LOTTERY_WITH_COUNT_SELECT
    ))
    .bind(now)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok((lotteries, total))
}

/// Every lottery, most recent event first.
pub async fn list_lotteries(
    pool: &PgPool,
    page: Page,
) -> Result<(Vec<LotteryWithTicketCount>, i64), sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lotteries")
        .fetch_one(pool)
        .await?;

    let lotteries = sqlx::query_as::<_, LotteryWithTicketCount>(&format!(
        "{} ORDER BY l.event_date DESC, l.id DESC LIMIT $1 OFFSET $2",
        LOTTERY_WITH_COUNT_SELECT
    ))
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok((lotteries, total))
}

/// Past lotteries regardless of the active flag, newest first.
pub async fn list_past_lotteries(
    pool: &PgPool,
    now: DateTime<Utc>,
    page: Page,
) -> Result<(Vec<LotteryWithTicketCount>, i64), sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lotteries WHERE event_date < $1")
        .bind(now)
        .fetch_one(pool)
        .await?;

    let lotteries = sqlx::query_as::<_, LotteryWithTicketCount>(&format!(
        "{} WHERE l.event_date < $1 ORDER BY l.event_date DESC, l.id DESC LIMIT $2 OFFSET $3",
        LOTTERY_WITH_COUNT_SELECT
    ))
    .bind(now)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok((lotteries, total))
}

pub async fn get_lottery_prizes(pool: &PgPool, lottery_id: i64) -> Result<Vec<Prize>, sqlx::Error> {
    sqlx::query_as::<_, Prize>(
        r#"
        SELECT p.id, p.title, p.type, p.description, p.quantity, p.winners, p.image
        FROM prizes p
        JOIN lottery_prizes lp ON lp.prize_id = p.id
        WHERE lp.lottery_id = $1
        ORDER BY lp.id ASC
        "#,
    )
    .bind(lottery_id)
    .fetch_all(pool)
    .await
}

/// Winners of prizes that belong to `lottery_id`, in award order.
pub async fn get_prize_winners(
    pool: &PgPool,
    lottery_id: i64,
) -> Result<Vec<PrizeWinner>, sqlx::Error> {
    sqlx::query_as::<_, PrizeWinner>(
        r#"
        SELECT up.prize_id, p.title, up.user_id, u.telegram, u.username, u.first_name
        FROM user_prizes up
        JOIN prizes p ON p.id = up.prize_id
        JOIN users u ON u.id = up.user_id
        WHERE up.prize_id IN (SELECT prize_id FROM lottery_prizes WHERE lottery_id = $1)
        ORDER BY up.id ASC
        "#,
    )
    .bind(lottery_id)
    .fetch_all(pool)
    .await
}

pub async fn get_winners(pool: &PgPool, lottery_id: i64) -> Result<Vec<WinnerItem>, sqlx::Error> {
    let winners = get_prize_winners(pool, lottery_id).await?;
    Ok(winners
        .into_iter()
        .map(|w| WinnerItem {
            prize_id: w.prize_id,
            title: w.title,
            user_id: w.user_id,
        })
        .collect())
}

fn short_user(winner: &PrizeWinner) -> ShortUser {
    ShortUser {
        id: winner.user_id,
        telegram_id: winner.telegram,
        username: winner.username.clone(),
        name: winner.first_name.clone(),
    }
}

/// Splits prizes into grand and ordinary ones and attaches their winners.
pub fn build_prize_board(prizes: &[Prize], winners: &[PrizeWinner]) -> PrizeBoard {
    let mut board = PrizeBoard::default();

    for prize in prizes {
        let info = PrizeInfo {
            id: prize.id,
            title: prize.title.clone(),
            image: prize.image.clone(),
            description: prize.description.clone(),
            quantity: prize.quantity,
            winners: winners
                .iter()
                .filter(|w| w.prize_id == prize.id)
                .map(short_user)
                .collect(),
        };
        if prize.is_grand() {
            board.grand_prizes.push(info);
        } else {
            board.prizes.push(info);
        }
    }

    for winner in winners {
        if !board.winners.iter().any(|u| u.id == winner.user_id) {
            board.winners.push(short_user(winner));
        }
    }

    board
}

pub async fn get_prize_board(pool: &PgPool, lottery_id: i64) -> Result<PrizeBoard, sqlx::Error> {
    let prizes = get_lottery_prizes(pool, lottery_id).await?;
    let winners = get_prize_winners(pool, lottery_id).await?;
    Ok(build_prize_board(&prizes, &winners))
}

pub async fn build_full_info(
    pool: &PgPool,
    lottery: &Lottery,
    other_lotteries: Option<Vec<LotteryInfo>>,
) -> Result<FullLotteryInfo, sqlx::Error> {
    let slots = get_prize_slots(pool, lottery.id).await?;
    let board = get_prize_board(pool, lottery.id).await?;

    Ok(FullLotteryInfo {
        info: LotteryInfo::from(lottery),
        total_sum: lottery.total_sum,
        ticket_price: price_to_f64(lottery.ticket_price),
        available_nft_count: slots.available(),
        total_nft_count: slots.total_slots,
        board,
        other_lotteries,
    })
}

/// Tickets of a lottery ordered by number, optionally limited to a number range.
pub async fn get_lottery_tickets(
    pool: &PgPool,
    lottery_id: i64,
    min_number: Option<i32>,
    max_number: Option<i32>,
    page: Page,
) -> Result<(Vec<Ticket>, i64), sqlx::Error> {
    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM tickets
        WHERE lottery_id = $1
          AND ($2::INT IS NULL OR number >= $2)
          AND ($3::INT IS NULL OR number <= $3)
        "#,
    )
    .bind(lottery_id)
    .bind(min_number)
    .bind(max_number)
    .fetch_one(pool)
    .await?;

    let tickets = sqlx::query_as::<_, Ticket>(
        r#"
        SELECT id, lottery_id, owner_id, number, name, image, address, expires_at
        FROM tickets
        WHERE lottery_id = $1
          AND ($2::INT IS NULL OR number >= $2)
          AND ($3::INT IS NULL OR number <= $3)
        ORDER BY number ASC
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(lottery_id)
    .bind(min_number)
    .bind(max_number)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok((tickets, total))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::Decimal;

    pub(crate) fn lottery(id: i64, is_active: bool, event_date: DateTime<Utc>) -> Lottery {
        Lottery {
            id,
            name: format!("Lottery {}", id),
            banner: "b".into(),
            collection_banner: "cb".into(),
            short_description: "s".into(),
            total_sum: 100,
            event_date,
            is_active,
            collection_name: "col".into(),
            collection_address: "addr".into(),
            collection_chain: String::new(),
            ticket_template: None,
            ticket_price: Decimal::new(1000, 2),
            created_at: event_date,
        }
    }

    fn prize(id: i64, prize_type: &str) -> Prize {
        Prize {
            id,
            title: format!("Prize {}", id),
            prize_type: prize_type.into(),
            description: "desc".into(),
            quantity: 1,
            winners: None,
            image: "img".into(),
        }
    }

    fn winner(prize_id: i64, user_id: i64) -> PrizeWinner {
        PrizeWinner {
            prize_id,
            title: format!("Prize {}", prize_id),
            user_id,
            telegram: user_id * 100,
            username: Some(format!("user{}", user_id)),
            first_name: None,
        }
    }

    #[test]
    fn two_slots_one_claim_leaves_one() {
        let slots = PrizeSlots {
            total_slots: 2,
            claimed_slots: 1,
        };
        assert_eq!(slots.available(), 1);
    }

    #[test]
    fn unknown_lottery_has_nothing_available() {
        assert_eq!(PrizeSlots::default().available(), 0);
    }

    #[test]
    fn over_claimed_lottery_goes_negative() {
        let slots = PrizeSlots {
            total_slots: 1,
            claimed_slots: 3,
        };
        assert_eq!(slots.available(), -2);
    }

    #[test]
    fn split_active_keeps_future_order() {
        let now = Utc::now();
        let lotteries = vec![
            lottery(1, false, now + Duration::hours(1)),
            lottery(2, true, now + Duration::hours(2)),
            lottery(3, false, now + Duration::days(1)),
        ];
        let (active, rest) = split_active(lotteries);
        assert_eq!(active.map(|l| l.id), Some(2));
        assert_eq!(rest.iter().map(|l| l.id).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn split_active_without_active() {
        let now = Utc::now();
        let (active, rest) = split_active(vec![lottery(1, false, now)]);
        assert!(active.is_none());
        assert_eq!(rest.len(), 1);
    }

    #[test]
    fn prize_board_groups_by_type_and_dedups_winners() {
        let prizes = vec![prize(1, "grand"), prize(2, "nft"), prize(3, "nft")];
        let winners = vec![winner(1, 10), winner(2, 10), winner(3, 11)];

        let board = build_prize_board(&prizes, &winners);

        assert_eq!(board.grand_prizes.len(), 1);
        assert_eq!(board.grand_prizes[0].id, 1);
        assert_eq!(board.grand_prizes[0].winners[0].id, 10);
        assert_eq!(board.prizes.iter().map(|p| p.id).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(board.prizes[1].winners[0].telegram_id, 1100);
        assert_eq!(board.winners.iter().map(|u| u.id).collect::<Vec<_>>(), vec![10, 11]);
    }

    #[test]
    fn prize_board_without_winners() {
        let board = build_prize_board(&[prize(1, "nft")], &[]);
        assert!(board.prizes[0].winners.is_empty());
        assert!(board.winners.is_empty());
    }
}
