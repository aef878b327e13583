use actix_web::{get, rt, web, HttpRequest, HttpResponse};
use actix_ws::Message;
use chrono::Utc;
use futures_util::StreamExt;
use log::{debug, info, warn};
use sqlx::PgPool;

use crate::config::Config;
use crate::errors::ApiError;
use crate::middleware::auth::AuthUser;
use crate::services::{live_status, lottery_service};
use crate::types::lottery_types::{
    price_to_f64, CheckLiveResponse, LiveStatus, LotteriesResponse, LotteryHistoryInfo,
    LotteryHistoryResponse, LotteryInfo, LotteryResponse, MarketNftToken, NftQuery,
    NftTokensResponse, WinnerUpdate, WsTokenQuery,
};
use crate::utils::jwt::{verify_token, TokenType};
use crate::utils::pagination::{Page, PageQuery};
use crate::utils::responses::Success;

#[get("")]
pub async fn get_lotteries(
    pool: web::Data<PgPool>,
    _user: AuthUser,
) -> Result<HttpResponse, ApiError> {
    let upcoming = lottery_service::get_upcoming_lotteries(pool.get_ref(), Utc::now()).await?;
    let (active, future) = lottery_service::split_active(upcoming);
    let active = active.ok_or_else(|| ApiError::not_found("Active lottery not found"))?;

    let active_lottery = lottery_service::build_full_info(pool.get_ref(), &active, None).await?;

    Ok(HttpResponse::Ok().json(LotteriesResponse {
        active_lottery,
        future_lotteries: future.iter().map(LotteryInfo::from).collect(),
    }))
}

#[get("/history")]
pub async fn get_lottery_history(
    pool: web::Data<PgPool>,
    _user: AuthUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = Page::from(&*query);
    let (lotteries, total) =
        lottery_service::get_lottery_history(pool.get_ref(), Utc::now(), page).await?;

    Ok(HttpResponse::Ok().json(Success::new(LotteryHistoryResponse {
        page: page.page,
        total_pages: page.total_pages(total),
        lotteries: lotteries.iter().map(LotteryHistoryInfo::from).collect(),
    })))
}

#[get("/status")]
pub async fn check_live_status(
    pool: web::Data<PgPool>,
    _user: AuthUser,
) -> Result<HttpResponse, ApiError> {
    let live_link = live_status::get_live_link(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(CheckLiveResponse {
        status: LiveStatus::from_link(live_link.as_deref()),
        live_link,
    }))
}

#[get("/nfts/{lottery_id}")]
pub async fn get_lottery_nfts(
    pool: web::Data<PgPool>,
    _user: AuthUser,
    path: web::Path<i64>,
    query: web::Query<NftQuery>,
) -> Result<HttpResponse, ApiError> {
    let lottery = lottery_service::get_lottery(pool.get_ref(), path.into_inner()).await?;
    let page = Page::new(query.page, query.limit);

    let (tickets, total) = lottery_service::get_lottery_tickets(
        pool.get_ref(),
        lottery.id,
        query.min_number,
        query.max_number,
        page,
    )
    .await?;

    let price = price_to_f64(lottery.ticket_price);
    let nfts = tickets
        .into_iter()
        .map(|t| MarketNftToken {
            id: t.id,
            ticket_number: t.number,
            name: t.name,
            image: t.image,
            address: t.address,
            price,
            buy_available: t.owner_id.is_none(),
        })
        .collect();

    Ok(HttpResponse::Ok().json(NftTokensResponse {
        page: page.page,
        total_pages: page.total_pages(total),
        nfts,
    }))
}

#[get("/{lottery_id}")]
pub async fn get_lottery_by_id(
    pool: web::Data<PgPool>,
    _user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let lottery = lottery_service::get_lottery(pool.get_ref(), path.into_inner()).await?;

    let others = lottery_service::get_upcoming_lotteries(pool.get_ref(), Utc::now())
        .await?
        .iter()
        .filter(|l| l.id != lottery.id)
        .map(LotteryInfo::from)
        .collect();

    let full = lottery_service::build_full_info(pool.get_ref(), &lottery, Some(others)).await?;
    Ok(HttpResponse::Ok().json(LotteryResponse { lottery: full }))
}

/// Sends the current winners of a lottery once, then keeps the socket
/// open answering pings until the client leaves.
#[get("/lotteries/winners/{lottery_id}")]
pub async fn winners_socket(
    req: HttpRequest,
    body: web::Payload,
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    path: web::Path<i64>,
    query: web::Query<WsTokenQuery>,
) -> Result<HttpResponse, ApiError> {
    let token = query
        .token
        .as_deref()
        .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;
    let user_id = verify_token(token, TokenType::Access, &config.jwt)?;

    let lottery_id = path.into_inner();
    let winners = lottery_service::get_winners(pool.get_ref(), lottery_id).await?;
    let snapshot = serde_json::to_string(&WinnerUpdate::new(winners))
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let (response, mut session, mut messages) = actix_ws::handle(&req, body)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    info!("User {} subscribed to winners of lottery {}", user_id, lottery_id);

    rt::spawn(async move {
        if session.text(snapshot).await.is_err() {
            return;
        }

        while let Some(msg) = messages.next().await {
            match msg {
                Ok(Message::Ping(bytes)) => {
                    if session.pong(&bytes).await.is_err() {
                        return;
                    }
                }
                Ok(Message::Close(reason)) => {
                    debug!("Winners socket for lottery {} closed", lottery_id);
                    let _ = session.close(reason).await;
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Winners socket error: {}", e);
                    break;
                }
            }
        }

        let _ = session.close(None).await;
    });

    Ok(response)
}
