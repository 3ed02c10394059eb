// src/services/share_service.rs

use image::{DynamicImage, ImageOutputFormat, Luma};
use qrcode::QrCode;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::survey::{ShareLink, Survey},
    services::{access_policy::Actor, survey_service::SurveyService},
};

/// Link público da pesquisa: `<base>/s/<id>`.
pub fn survey_link(public_base_url: &str, survey_id: Uuid) -> String {
    format!("{}/s/{}", public_base_url.trim_end_matches('/'), survey_id)
}

/// PNG com o QR Code do texto informado.
pub fn qr_png(content: &str) -> Result<Vec<u8>, AppError> {
    let code = QrCode::new(content.as_bytes())
        .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;

    let image_buffer = code.render::<Luma<u8>>().min_dimensions(256, 256).build();
    let dynamic_image = DynamicImage::ImageLuma8(image_buffer);

    let mut buffer = Vec::new();
    dynamic_image
        .write_to(&mut buffer, ImageOutputFormat::Png)
        .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;

    Ok(buffer)
}

// Só consome a pesquisa pronta (id e título); não participa do provisionamento
#[derive(Clone)]
pub struct ShareService {
    survey_service: SurveyService,
    public_base_url: String,
}

impl ShareService {
    pub fn new(survey_service: SurveyService, public_base_url: String) -> Self {
        Self { survey_service, public_base_url }
    }

    fn link_for(&self, survey: &Survey) -> ShareLink {
        ShareLink {
            survey_id: survey.id,
            title: survey.title.clone(),
            url: survey_link(&self.public_base_url, survey.id),
        }
    }

    pub async fn share_link(&self, actor: &Actor, survey_id: Uuid) -> Result<ShareLink, AppError> {
        let survey = self.survey_service.load_visible(actor, survey_id).await?;
        Ok(self.link_for(&survey))
    }

    pub async fn qr_code(&self, actor: &Actor, survey_id: Uuid) -> Result<Vec<u8>, AppError> {
        let link = self.share_link(actor, survey_id).await?;
        qr_png(&link.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_ignores_trailing_slash() {
        let id = Uuid::nil();
        assert_eq!(
            survey_link("https://app.qualitivate.com/", id),
            "https://app.qualitivate.com/s/00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn qr_is_a_png() {
        let png = qr_png("https://app.qualitivate.com/s/abc").unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
    }
}
