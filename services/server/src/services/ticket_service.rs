use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use sqlx::PgPool;

use crate::errors::ApiError;
use crate::models::ticket_model::{OwnedTicket, Ticket};
use crate::types::admin_types::TicketInput;
use crate::types::lottery_types::LotteryShortInfo;
use crate::types::user_types::{UserLotteryTokens, UserNftToken};
use crate::utils::pagination::Page;

pub const RESERVATION_MINUTES: i64 = 15;

const PAYMENT_GATEWAY_URL: &str = "https://fake.payment.gateway/nft";

pub fn reservation_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::minutes(RESERVATION_MINUTES)
}

pub fn payment_link(ticket_id: i64, user_id: i64) -> String {
    format!("{}/{}?user={}", PAYMENT_GATEWAY_URL, ticket_id, user_id)
}

pub async fn find_ticket(pool: &PgPool, ticket_id: i64) -> Result<Option<Ticket>, sqlx::Error> {
    sqlx::query_as::<_, Ticket>(
        "SELECT id, lottery_id, owner_id, number, name, image, address, expires_at \
         FROM tickets WHERE id = $1",
    )
    .bind(ticket_id)
    .fetch_optional(pool)
    .await
}

/// Claims an unowned ticket for `user_id` and returns its payment link.
///
/// The claim is a single conditional update, so two buyers racing for the
/// same ticket cannot both succeed.
pub async fn reserve_ticket(pool: &PgPool, ticket_id: i64, user_id: i64) -> Result<String, ApiError> {
    let now = Utc::now();
    let claimed = sqlx::query_as::<_, Ticket>(
        r#"
        UPDATE tickets
        SET owner_id = $1, expires_at = $2
        WHERE id = $3 AND owner_id IS NULL
        RETURNING id, lottery_id, owner_id, number, name, image, address, expires_at
        "#,
    )
    .bind(user_id)
    .bind(reservation_expiry(now))
    .bind(ticket_id)
    .fetch_optional(pool)
    .await?;

    match claimed {
        Some(ticket) => {
            info!("Ticket {} reserved by user {}", ticket.id, user_id);
            Ok(payment_link(ticket.id, user_id))
        }
        None => match find_ticket(pool, ticket_id).await? {
            Some(_) => Err(ApiError::forbidden("Ticket already sold")),
            None => Err(ApiError::not_found("Ticket not found")),
        },
    }
}

/// Tickets owned by `user_id`, newest lottery first.
pub async fn get_user_tickets(
    pool: &PgPool,
    user_id: i64,
    page: Page,
) -> Result<(Vec<OwnedTicket>, i64), sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tickets WHERE owner_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    let tickets = sqlx::query_as::<_, OwnedTicket>(
        r#"
        SELECT t.id, t.number, t.name, t.image, t.address,
               l.id AS lottery_id, l.name AS lottery_name, l.event_date AS lottery_event_date
        FROM tickets t
        JOIN lotteries l ON l.id = t.lottery_id
        WHERE t.owner_id = $1
        ORDER BY l.event_date DESC, l.id DESC, t.number ASC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok((tickets, total))
}

/// Groups consecutive tickets of the same lottery, keeping the input order.
pub fn group_by_lottery(tickets: Vec<OwnedTicket>) -> Vec<UserLotteryTokens> {
    let mut groups: Vec<UserLotteryTokens> = Vec::new();

    for ticket in tickets {
        let token = UserNftToken {
            id: ticket.id,
            ticket_number: ticket.number,
            name: ticket.name,
            image: ticket.image,
            address: ticket.address,
        };

        match groups.iter_mut().find(|g| g.lottery.id == ticket.lottery_id) {
            Some(group) => group.nfts.push(token),
            None => groups.push(UserLotteryTokens {
                lottery: LotteryShortInfo {
                    id: ticket.lottery_id,
                    name: ticket.lottery_name,
                    event_date: ticket.lottery_event_date.timestamp(),
                },
                nfts: vec![token],
            }),
        }
    }

    groups
}

/// Inserts a batch of tickets for one lottery. Either all are created or none.
pub async fn create_tickets(
    pool: &PgPool,
    lottery_id: i64,
    tickets: &[TicketInput],
) -> Result<usize, ApiError> {
    let mut tx = pool.begin().await?;

    for ticket in tickets {
        let inserted = sqlx::query(
            "INSERT INTO tickets (lottery_id, number, name, image, address) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(lottery_id)
        .bind(ticket.number)
        .bind(&ticket.name)
        .bind(&ticket.image)
        .bind(&ticket.address)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            return Err(match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    warn!("Duplicate ticket number {} in lottery {}", ticket.number, lottery_id);
                    ApiError::bad_request(format!("Ticket number {} already exists", ticket.number))
                }
                other => other.into(),
            });
        }
    }

    tx.commit().await?;
    info!("Created {} tickets for lottery {}", tickets.len(), lottery_id);
    Ok(tickets.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn owned(id: i64, number: i32, lottery_id: i64) -> OwnedTicket {
        OwnedTicket {
            id,
            number,
            name: format!("NFT #{}", number),
            image: "img".into(),
            address: format!("TON{}", id),
            lottery_id,
            lottery_name: format!("Lottery {}", lottery_id),
            lottery_event_date: Utc.timestamp_opt(1_700_000_000 + lottery_id, 0).unwrap(),
        }
    }

    #[test]
    fn reservation_lasts_fifteen_minutes() {
        let now = Utc::now();
        let expiry = reservation_expiry(now);
        assert_eq!((expiry - now).num_minutes(), 15);
    }

    #[test]
    fn payment_link_carries_ticket_and_user() {
        assert_eq!(
            payment_link(12, 34),
            "https://fake.payment.gateway/nft/12?user=34"
        );
    }

    #[test]
    fn tickets_grouped_per_lottery() {
        let groups = group_by_lottery(vec![owned(1, 5, 2), owned(2, 6, 2), owned(3, 1, 1)]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].lottery.id, 2);
        assert_eq!(groups[0].lottery.event_date, 1_700_000_002);
        assert_eq!(
            groups[0].nfts.iter().map(|n| n.ticket_number).collect::<Vec<_>>(),
            vec![5, 6]
        );
        assert_eq!(groups[1].lottery.name, "Lottery 1");
        assert_eq!(groups[1].nfts[0].address, "TON3");
    }

    #[test]
    fn no_tickets_no_groups() {
        assert!(group_by_lottery(Vec::new()).is_empty());
    }
}
