// src/model/ad.rs

use serde::{Serialize, Deserialize};
use proptest::prelude::*;
use proptest::strategy::ValueTree;

/// 广告素材类型，线上协议采用小写字符串（"video" / "image"）
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AdType {
    Video,
    Image,
}

impl AdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdType::Video => "video",
            AdType::Image => "image",
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// 广告素材基础信息
/// `videoUrl` 仅在 type=video 时出现，`imageUrl` 仅在 type=image 时出现，
/// 序列化时缺失的一侧整体省略。
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Ad {
    pub id: String,                 // 广告 ID（创建时由用户指定，之后不可变）
    #[serde(default)]
    pub client_id: String,          // 所属客户端 ID
    pub title: String,              // 广告标题
    #[serde(rename = "type")]
    pub ad_type: AdType,            // 素材类型
    #[serde(default = "default_enabled")]
    pub enabled: bool,              // 是否投放
    #[serde(default)]
    pub categories: Vec<String>,    // 分类标签（有序）
    #[serde(default)]
    pub click_url: String,          // 点击跳转地址
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,  // 视频素材地址
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,  // 图片素材地址
}

/// 使用 proptest 生成随机的 Ad
fn generate_ad(client_ids: Vec<String>) -> impl Strategy<Value = Ad> {
    (
        "[a-zA-Z]{4,12}( [a-zA-Z]{3,10}){0,2}",
        any::<bool>(),
        any::<bool>(),
        proptest::sample::subsequence(
            vec!["promo".to_string(), "game".to_string(), "reward".to_string(), "hint".to_string()],
            0..3,
        ),
        proptest::sample::select(client_ids),
    )
        .prop_map(|(title, is_video, enabled, categories, client_id)| {
            let ad_type = if is_video { AdType::Video } else { AdType::Image };
            Ad {
                id: String::new(), // 占位 id，由调用方统一分配
                client_id,
                title,
                ad_type,
                enabled,
                categories,
                click_url: "https://example.com/click".to_string(),
                video_url: matches!(ad_type, AdType::Video)
                    .then(|| "https://example.com/ad.mp4".to_string()),
                image_url: matches!(ad_type, AdType::Image)
                    .then(|| "https://example.com/ad.png".to_string()),
            }
        })
}

/// 初始化并生成一批随机广告（用于 mock 后端的种子数据），并打印生成的信息
pub fn seed_ads(client_ids: &[&str]) -> Vec<Ad> {
    let ids: Vec<String> = client_ids.iter().map(|s| s.to_string()).collect();
    let mut runner = proptest::test_runner::TestRunner::default();
    let mut ads = proptest::collection::vec(generate_ad(ids), 4..8)
        .new_tree(&mut runner)
        .unwrap()
        .current();

    // 保证至少一条可投放的广告
    if !ads.iter().any(|a| a.enabled) {
        if let Some(first) = ads.first_mut() {
            first.enabled = true;
        }
    }
    for (i, ad) in ads.iter_mut().enumerate() {
        ad.id = format!("ad_{}", i + 1);
    }

    println!("Generated {} seed ads", ads.len());
    for ad in &ads {
        println!(
            "ID: {}, Client: {}, Title: {}, Type: {}, Enabled: {}",
            ad.id, ad.client_id, ad.title, ad.ad_type.as_str(), ad.enabled
        );
    }

    ads
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ad_serializes_with_camel_case_and_type_tag() {
        let ad = Ad {
            id: "a1".to_string(),
            client_id: "game_a".to_string(),
            title: "Sale".to_string(),
            ad_type: AdType::Image,
            enabled: true,
            categories: vec!["promo".to_string()],
            click_url: "https://example.com".to_string(),
            video_url: None,
            image_url: Some("u".to_string()),
        };
        let v = serde_json::to_value(&ad).unwrap();
        assert_eq!(v["clientId"], "game_a");
        assert_eq!(v["type"], "image");
        assert_eq!(v["imageUrl"], "u");
        // type=image 时 videoUrl 整体省略
        assert!(v.get("videoUrl").is_none());
    }

    #[test]
    fn ad_deserializes_with_defaults() {
        let ad: Ad = serde_json::from_str(
            r#"{"id":"a1","title":"Sale","type":"video","clickUrl":"c","videoUrl":"v"}"#,
        )
        .unwrap();
        assert_eq!(ad.ad_type, AdType::Video);
        assert!(ad.enabled);
        assert!(ad.categories.is_empty());
        assert_eq!(ad.client_id, "");
        assert_eq!(ad.video_url.as_deref(), Some("v"));
    }

    #[test]
    fn seed_ads_assigns_unique_ids() {
        let ads = seed_ads(&["game_a", "game_b"]);
        assert!(!ads.is_empty());
        assert!(ads.iter().any(|a| a.enabled));
        let mut ids: Vec<_> = ads.iter().map(|a| a.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), ads.len());
    }
}
