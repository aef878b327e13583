use actix_multipart::Multipart;
use actix_web::{get, post, put, web, HttpResponse};
use chrono::Utc;
use futures_util::StreamExt;
use log::info;
use sqlx::PgPool;

use crate::config::Config;
use crate::errors::ApiError;
use crate::services::file_upload::{FileUpload, UploadError};
use crate::services::{admin_service, live_status, lottery_service, user_service};
use crate::types::admin_types::{
    ChangeLiveStatusRequest, ChangeLiveStatusResponse, SetActiveLotteryResponse,
    ShortLotteriesResponse, UploadResponse,
};
use crate::types::auth_types::InitDataForm;
use crate::types::lottery_types::{LiveStatus, LotteryShortInfo};
use crate::utils::responses::Success;

#[post("/admin/login")]
pub async fn admin_login(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    form: web::Form<InitDataForm>,
) -> Result<HttpResponse, ApiError> {
    let login = user_service::login_by_init_data(pool.get_ref(), &config, &form.init_data).await?;
    Ok(HttpResponse::Ok().json(Success::new(login)))
}

#[get("/stat")]
pub async fn get_stat(pool: web::Data<PgPool>) -> Result<HttpResponse, ApiError> {
    let stat = admin_service::get_admin_statistics(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(Success::new(stat)))
}

#[get("/lotteries/short")]
pub async fn get_short_lotteries(pool: web::Data<PgPool>) -> Result<HttpResponse, ApiError> {
    let lotteries = lottery_service::get_upcoming_lotteries(pool.get_ref(), Utc::now()).await?;

    Ok(HttpResponse::Ok().json(Success::new(ShortLotteriesResponse {
        lotteries: lotteries.iter().map(LotteryShortInfo::from).collect(),
    })))
}

#[put("/lotteries/setActive/{lottery_id}")]
pub async fn set_active_lottery(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let lottery = lottery_service::set_active_lottery(pool.get_ref(), path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(Success::new(SetActiveLotteryResponse {
        active_lottery: LotteryShortInfo::from(&lottery),
    })))
}

#[put("/changeLiveStatus")]
pub async fn change_live_status(
    pool: web::Data<PgPool>,
    body: web::Json<ChangeLiveStatusRequest>,
) -> Result<HttpResponse, ApiError> {
    if lottery_service::get_active_lottery(pool.get_ref()).await?.is_none() {
        return Err(ApiError::not_found("Active lottery not found"));
    }

    live_status::set_live_link(pool.get_ref(), &body.live_link).await?;

    Ok(HttpResponse::Ok().json(Success::new(ChangeLiveStatusResponse {
        live_status: LiveStatus::from_link(Some(body.live_link.as_str())),
    })))
}

/// Accepts one multipart `file` field and stores it as a banner image.
#[post("/upload")]
pub async fn upload_file(
    config: web::Data<Config>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let uploader = FileUpload::new(&config.upload_dir, config.upload_max_bytes, &config.app_url);

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|_| ApiError::bad_request("Invalid multipart payload"))?;
        if field.name() != "file" {
            continue;
        }

        let filename = field
            .content_disposition()
            .get_filename()
            .map(str::to_string)
            .ok_or_else(|| ApiError::bad_request("File name is missing"))?;
        FileUpload::allowed_extension(&filename)?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk.map_err(|_| ApiError::bad_request("Failed to read upload"))?;
            bytes.extend_from_slice(&data);
            uploader.check_size(bytes.len())?;
        }

        let url = uploader.save(&filename, &bytes).await?;
        info!("Admin uploaded {}", url);
        return Ok(HttpResponse::Ok().json(UploadResponse { url }));
    }

    Err(UploadError::Missing.into())
}
