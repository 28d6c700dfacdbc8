//! HTTP client for the record API, used by the form and map views.

use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::UPLOAD_FIELD;
use crate::db::DynError;
use crate::record::Record;

/// A file picked by the user for upload
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    image_url: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteResponse {
    deleted_count: u64,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, DynError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, DynError> {
        Ok(self.base.join(path)?)
    }

    pub async fn list_records(&self) -> Result<Vec<Record>, DynError> {
        let resp = self.http.get(self.url("record/")?).send().await?;
        Ok(check_status(resp)?.json().await?)
    }

    /// Fetch one record; `Ok(None)` when the server answers 404
    pub async fn get_record(&self, id: &str) -> Result<Option<Record>, DynError> {
        let resp = self.http.get(self.url(&format!("record/{}", id))?).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(check_status(resp)?.json().await?))
    }

    pub async fn create_record<T: Serialize + ?Sized>(&self, body: &T) -> Result<Record, DynError> {
        let resp = self.http.post(self.url("record")?).json(body).send().await?;
        Ok(check_status(resp)?.json().await?)
    }

    pub async fn update_record<T: Serialize + ?Sized>(
        &self,
        id: &str,
        body: &T,
    ) -> Result<Record, DynError> {
        let resp = self
            .http
            .patch(self.url(&format!("record/{}", id))?)
            .json(body)
            .send()
            .await?;
        Ok(check_status(resp)?.json().await?)
    }

    pub async fn delete_record(&self, id: &str) -> Result<u64, DynError> {
        let resp = self
            .http
            .delete(self.url(&format!("record/{}", id))?)
            .send()
            .await?;
        let body: DeleteResponse = check_status(resp)?.json().await?;
        Ok(body.deleted_count)
    }

    /// Upload one image, returning the public URL the server assigned
    pub async fn upload_image(&self, file: &ImageFile) -> Result<String, DynError> {
        let part = Part::bytes(file.bytes.clone()).file_name(file.name.clone());
        let form = Form::new().part(UPLOAD_FIELD, part);

        let resp = self
            .http
            .post(self.url("upload")?)
            .multipart(form)
            .send()
            .await?;
        let status = resp.status();
        let body: UploadResponse = resp.json().await?;

        match body.image_url {
            Some(url) if status.is_success() => Ok(url),
            _ => Err(body
                .message
                .unwrap_or_else(|| "Failed to upload image".to_string())
                .into()),
        }
    }
}

fn check_status(resp: Response) -> Result<Response, DynError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(format!("HTTP error! status: {}", status.as_u16()).into());
    }
    Ok(resp)
}
