// src/portal/modal.rs

use crate::api::error::ApiError;
use crate::model::ad::{Ad, AdType};

/// 弹窗模式：创建时 id 可编辑，编辑时 id 锁定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalMode {
    Create,
    Edit,
}

/// 创建/编辑广告的表单状态。
/// 字段保持原始字符串，提交时才做裁剪与校验；
/// URL 输入只有与当前类型匹配的一侧会进入最终 payload。
#[derive(Debug, Clone)]
pub struct ModalState {
    pub mode: ModalMode,
    pub heading: String, // "Create Ad" / "Edit Ad"
    pub client_id: String,
    pub client_id_locked: bool,
    pub id: String,
    pub id_editable: bool,
    pub title: String,
    pub ad_type: AdType,
    pub enabled: bool,
    pub categories: String, // 逗号分隔的原始输入
    pub click_url: String,
    pub video_url: String,
    pub image_url: String,
}

/// 逗号分隔的分类输入 → 有序去空白列表
pub fn parse_categories(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl ModalState {
    /// 创建模式：空缺省值，clientId 预填最近一次用过的（或被锁定的）值
    pub fn create(last_client_id: Option<&str>, locked_client: Option<&str>) -> Self {
        Self {
            mode: ModalMode::Create,
            heading: "Create Ad".to_string(),
            client_id: locked_client
                .or(last_client_id)
                .unwrap_or_default()
                .to_string(),
            client_id_locked: locked_client.is_some(),
            id: String::new(),
            id_editable: true,
            title: String::new(),
            ad_type: AdType::Video,
            enabled: true,
            categories: String::new(),
            click_url: String::new(),
            video_url: String::new(),
            image_url: String::new(),
        }
    }

    /// 编辑模式：从选中的广告预填所有字段，id 不可编辑
    pub fn edit(ad: &Ad, locked_client: Option<&str>) -> Self {
        Self {
            mode: ModalMode::Edit,
            heading: "Edit Ad".to_string(),
            client_id: ad.client_id.clone(),
            client_id_locked: locked_client.is_some(),
            id: ad.id.clone(),
            id_editable: false,
            title: ad.title.clone(),
            ad_type: ad.ad_type,
            enabled: ad.enabled,
            categories: ad.categories.join(", "),
            click_url: ad.click_url.clone(),
            video_url: ad.video_url.clone().unwrap_or_default(),
            image_url: ad.image_url.clone().unwrap_or_default(),
        }
    }

    /// 切换类型选择器，URL 输入的可见侧随之改变
    pub fn set_type(&mut self, ad_type: AdType) {
        self.ad_type = ad_type;
    }

    /// 当前应该展示哪个 URL 输入
    pub fn visible_url_field(&self) -> AdType {
        self.ad_type
    }

    /// 校验并产出提交 payload。
    /// 与当前类型不匹配的 URL 字段直接省略，哪怕输入框里有内容。
    pub fn build_payload(&self) -> Result<Ad, ApiError> {
        let client_id = self.client_id.trim();
        if client_id.is_empty() {
            return Err(ApiError::Validation("Client ID is required".to_string()));
        }
        let id = self.id.trim();
        if id.is_empty() {
            return Err(ApiError::Validation("Ad ID is required".to_string()));
        }

        Ok(Ad {
            id: id.to_string(),
            client_id: client_id.to_string(),
            title: self.title.trim().to_string(),
            ad_type: self.ad_type,
            enabled: self.enabled,
            categories: parse_categories(&self.categories),
            click_url: self.click_url.trim().to_string(),
            video_url: matches!(self.ad_type, AdType::Video)
                .then(|| self.video_url.trim().to_string()),
            image_url: matches!(self.ad_type, AdType::Image)
                .then(|| self.image_url.trim().to_string()),
        })
    }
}
