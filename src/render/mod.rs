pub mod html;

use serde::Serialize;

use crate::listing::{ListingStats, PageView};
use crate::models::{Animal, DonationMessage};

pub const EMPTY_LISTING: &str = "No animals match your filters. Try widening your search.";
pub const EMPTY_DONATIONS: &str = "No donations yet. Be the first to help!";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("${amount:.0}")
    } else {
        format!("${amount:.2}")
    }
}

pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListingDocument<'a> {
    #[serde(flatten)]
    page: &'a PageView<'a>,
    stats: &'a ListingStats,
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Vec<u8> {
    let mut out = serde_json::to_vec_pretty(value).unwrap_or_else(|_| b"null".to_vec());
    out.push(b'\n');
    out
}

pub fn render_listing(view: &PageView<'_>, stats: &ListingStats, format: OutputFormat) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_listing_text(view, stats).into_bytes(),
        OutputFormat::Json => to_json(&ListingDocument { page: view, stats }),
        OutputFormat::Html => html::render_listing(view, stats).into_bytes(),
    }
}

pub fn render_animal(animal: &Animal, format: OutputFormat) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_animal_text(animal).into_bytes(),
        OutputFormat::Json => to_json(animal),
        OutputFormat::Html => html::render_animal(animal).into_bytes(),
    }
}

pub fn render_donations(messages: &[DonationMessage], format: OutputFormat) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_donations_text(messages).into_bytes(),
        OutputFormat::Json => to_json(messages),
        OutputFormat::Html => html::render_donations(messages).into_bytes(),
    }
}

fn card_line(animal: &Animal) -> String {
    format!(
        "#{:<5} {:<14} {} | {} | {} | {} | {}",
        animal.id,
        animal.name,
        animal.breed_label(),
        animal.age,
        animal.gender,
        animal.location,
        animal.status().label()
    )
}

fn render_listing_text(view: &PageView<'_>, stats: &ListingStats) -> String {
    let mut out = String::new();
    if view.is_empty() {
        out.push_str(EMPTY_LISTING);
        out.push('\n');
        return out;
    }
    out.push_str(&format!(
        "Showing {} of {} animals ({} dogs, {} cats, {} others)\n\n",
        view.items.len(),
        stats.total,
        stats.dogs,
        stats.cats,
        stats.others
    ));
    for animal in &view.items {
        out.push_str(&card_line(animal));
        out.push('\n');
    }
    if view.total_pages > 1 {
        let buttons = view
            .buttons
            .iter()
            .map(|p| {
                if *p == view.page {
                    format!("[{p}]")
                } else {
                    p.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        let prev = if view.has_prev { "< prev " } else { "" };
        let next = if view.has_next { " next >" } else { "" };
        out.push_str(&format!(
            "\nPage {} of {}: {prev}{buttons}{next}\n",
            view.page, view.total_pages
        ));
    }
    out
}

fn render_animal_text(animal: &Animal) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} (#{})\n", animal.name, animal.id));
    out.push_str(&format!("  {:<10}: {}\n", "Breed", animal.breed_label()));
    out.push_str(&format!("  {:<10}: {}\n", "Age", animal.age));
    out.push_str(&format!("  {:<10}: {}\n", "Gender", animal.gender));
    if !animal.size.trim().is_empty() {
        out.push_str(&format!("  {:<10}: {}\n", "Size", capitalize(&animal.size)));
    }
    out.push_str(&format!("  {:<10}: {}\n", "Location", animal.location));
    out.push_str(&format!(
        "  {:<10}: {}\n",
        "Neutered",
        if animal.neutered { "Yes" } else { "No" }
    ));
    out.push_str(&format!("  {:<10}: {}\n", "Status", animal.status().label()));
    if !animal.personality.is_empty() {
        out.push_str(&format!(
            "  {:<10}: {}\n",
            "Traits",
            animal.personality.join(", ")
        ));
    }
    out.push_str(&format!("  {:<10}: {}\n", "Photo", animal.image));
    if !animal.story.trim().is_empty() {
        out.push('\n');
        out.push_str(animal.story.trim());
        out.push('\n');
    }
    out
}

fn render_donations_text(messages: &[DonationMessage]) -> String {
    if messages.is_empty() {
        return format!("{EMPTY_DONATIONS}\n");
    }
    let mut out = String::new();
    for m in messages {
        out.push_str(&format!(
            "{} donated {} ({})\n",
            m.donor_name,
            format_amount(m.amount),
            m.donation_time
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::ListController;

    fn animals() -> Vec<Animal> {
        (1..=8)
            .map(|i| {
                Animal {
                    id: i.to_string(),
                    name: format!("Pet{i}"),
                    kind: if i % 2 == 0 { "dog" } else { "cat" }.to_string(),
                    ..Animal::default()
                }
                .normalized()
            })
            .collect()
    }

    #[test]
    fn format_parse_and_inference() {
        assert_eq!(OutputFormat::parse(" JSON "), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("htm"), Some(OutputFormat::Html));
        assert_eq!(OutputFormat::parse("xml"), None);
        assert_eq!(infer_format_from_path("out.HTML"), Some(OutputFormat::Html));
        assert_eq!(infer_format_from_path("out.csv"), None);
    }

    #[test]
    fn text_listing_shows_pager() {
        let list = ListController::new(animals(), 6).unwrap();
        let out = String::from_utf8(render_listing(
            &list.view(),
            &list.stats(),
            OutputFormat::Text,
        ))
        .unwrap();
        assert!(out.contains("Showing 6 of 8 animals"));
        assert!(out.contains("Page 1 of 2: [1] 2 next >"));
        assert!(!out.contains("< prev"));
        assert!(!out.contains("Pet7"));

        let mut list = list;
        list.next_page();
        let out = String::from_utf8(render_listing(
            &list.view(),
            &list.stats(),
            OutputFormat::Text,
        ))
        .unwrap();
        assert!(out.contains("Page 2 of 2: < prev 1 [2]\n"));
    }

    #[test]
    fn empty_listing_has_explicit_message() {
        let list = ListController::new(Vec::new(), 6).unwrap();
        for format in [OutputFormat::Text, OutputFormat::Html] {
            let out = String::from_utf8(render_listing(&list.view(), &list.stats(), format)).unwrap();
            assert!(out.contains(EMPTY_LISTING));
        }
    }

    #[test]
    fn json_listing_carries_page_metadata() {
        let list = ListController::new(animals(), 6).unwrap();
        let out = render_listing(&list.view(), &list.stats(), OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["page"], 1);
        assert_eq!(value["totalPages"], 2);
        assert_eq!(value["items"].as_array().unwrap().len(), 6);
        assert_eq!(value["stats"]["dogs"], 4);
        assert_eq!(value["items"][0]["type"], "cat");
    }

    #[test]
    fn donations_render_amounts() {
        let messages = vec![DonationMessage {
            donor_name: "Li**".into(),
            amount: 1000.0,
            donation_time: "1 day ago".into(),
        }];
        let out = String::from_utf8(render_donations(&messages, OutputFormat::Text)).unwrap();
        assert_eq!(out, "Li** donated $1000 (1 day ago)\n");
        assert_eq!(format_amount(12.5), "$12.50");
        let empty = String::from_utf8(render_donations(&[], OutputFormat::Text)).unwrap();
        assert!(empty.contains(EMPTY_DONATIONS));
    }

    #[test]
    fn capitalize_first_letter() {
        assert_eq!(capitalize("medium"), "Medium");
        assert_eq!(capitalize(""), "");
    }
}
