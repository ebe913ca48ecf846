// src/view/renderer.rs

use crate::model::ad::Ad;

/// 转义用户输入，防止标记注入
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Enabled 列的呈现方式：完整版用复选框，只读版用固定符号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnabledControl {
    Checkbox,
    Glyph,
}

/// 把广告列表渲染成 HTML 表格。
/// 列表为空时返回固定文案；所有用户可控字段都经过转义；
/// 行内控件带 data-id，供上层做事件委托。
pub fn render_ads(ads: &[Ad], control: EnabledControl) -> String {
    if ads.is_empty() {
        return "No ads found.".to_string();
    }

    let mut html = String::new();
    html.push_str("<table class=\"table\">");
    html.push_str(
        "<thead><tr>\
         <th>Client ID</th><th>ID</th><th>Title</th><th>Type</th>\
         <th>Enabled</th><th>Categories</th><th>Actions</th>\
         </tr></thead>",
    );
    html.push_str("<tbody>");

    for ad in ads {
        let id = escape_html(&ad.id);
        let enabled_cell = match control {
            EnabledControl::Checkbox => {
                let checked = if ad.enabled { " checked" } else { "" };
                format!(
                    "<input type=\"checkbox\" class=\"enabled-toggle\" data-id=\"{}\"{} />",
                    id, checked
                )
            }
            EnabledControl::Glyph => (if ad.enabled { "✔" } else { "✖" }).to_string(),
        };

        html.push_str(&format!(
            "<tr>\
             <td>{client}</td>\
             <td>{id}</td>\
             <td>{title}</td>\
             <td>{ad_type}</td>\
             <td>{enabled}</td>\
             <td>{categories}</td>\
             <td>\
             <button class=\"row-btn edit-btn\" data-id=\"{id}\">Edit</button>\
             <button class=\"row-btn delete-btn\" data-id=\"{id}\">Delete</button>\
             </td>\
             </tr>",
            client = escape_html(&ad.client_id),
            id = id,
            title = escape_html(&ad.title),
            ad_type = escape_html(ad.ad_type.as_str()),
            enabled = enabled_cell,
            categories = escape_html(&ad.categories.join(", ")),
        ));
    }

    html.push_str("</tbody></table>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ad::AdType;
    use proptest::prelude::*;

    fn sample_ad(id: &str, title: &str, enabled: bool) -> Ad {
        Ad {
            id: id.to_string(),
            client_id: "game_a".to_string(),
            title: title.to_string(),
            ad_type: AdType::Image,
            enabled,
            categories: vec!["promo".to_string()],
            click_url: "https://example.com".to_string(),
            video_url: None,
            image_url: Some("u".to_string()),
        }
    }

    #[test]
    fn empty_list_renders_fixed_message() {
        assert_eq!(render_ads(&[], EnabledControl::Checkbox), "No ads found.");
    }

    #[test]
    fn one_row_per_ad() {
        let ads = vec![
            sample_ad("a1", "Sale", true),
            sample_ad("a2", "Promo", false),
            sample_ad("a3", "Hint", true),
        ];
        let html = render_ads(&ads, EnabledControl::Checkbox);
        assert_eq!(html.matches("<tr>").count() - 1, ads.len()); // 扣掉表头那一行
        assert_eq!(html.matches("delete-btn").count(), ads.len());
    }

    #[test]
    fn example_row_contains_escaped_title_and_checked_box() {
        let ads = vec![sample_ad("a1", "Sale", true)];
        let html = render_ads(&ads, EnabledControl::Checkbox);
        assert!(html.contains("<td>Sale</td>"));
        assert!(html.contains("<td>promo</td>"));
        assert!(html.contains("data-id=\"a1\" checked"));
    }

    #[test]
    fn hostile_title_is_escaped() {
        let ads = vec![sample_ad("a1", "<script>alert('x')</script>\"&", true)];
        let html = render_ads(&ads, EnabledControl::Checkbox);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&quot;&amp;"));
        assert!(html.contains("&#039;x&#039;"));
    }

    #[test]
    fn glyph_variant_has_no_controls() {
        let enabled = vec![sample_ad("a1", "Sale", true)];
        let disabled = vec![sample_ad("a2", "Sale", false)];
        let on = render_ads(&enabled, EnabledControl::Glyph);
        let off = render_ads(&disabled, EnabledControl::Glyph);
        assert!(on.contains("<td>✔</td>"));
        assert!(off.contains("<td>✖</td>"));
        assert!(!on.contains("enabled-toggle"));
    }

    proptest! {
        /// 任意标题经渲染后都不会泄漏未转义的尖括号
        #[test]
        fn no_raw_angle_brackets_leak(title in "\\PC{0,40}") {
            let ads = vec![sample_ad("a1", &title, true)];
            let html = render_ads(&ads, EnabledControl::Glyph);
            let cell = format!("<td>{}</td>", escape_html(&title));
            prop_assert!(html.contains(&cell));
            prop_assert!(!escape_html(&title).contains('<'));
            prop_assert!(!escape_html(&title).contains('>'));
        }
    }
}
