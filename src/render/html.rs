use crate::listing::{ListingStats, PageView};
use crate::models::{Animal, DonationMessage};

use super::{capitalize, format_amount, EMPTY_DONATIONS, EMPTY_LISTING};

pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn page(title: &str, body: &str) -> String {
    format!(
        r####"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>{title}</title>
  <style>
    body {{
      font-family: 'Inter', sans-serif;
      background: #f8fafc;
      color: #0f172a;
      margin: 0;
    }}
    main {{ max-width: 1200px; margin: 0 auto; padding: 2rem; }}
    .grid {{ display: grid; grid-template-columns: repeat(auto-fill, minmax(260px, 1fr)); gap: 1.5rem; }}
    .card {{ background: #fff; border: 1px solid #e2e8f0; border-radius: 1rem; overflow: hidden; }}
    .card img {{ width: 100%; height: 200px; object-fit: cover; }}
    .card .info {{ padding: 1rem; }}
    .status {{ display: inline-block; padding: 0.2rem 0.6rem; border-radius: 9999px; font-size: 0.75rem; }}
    .status-available {{ background: #dcfce7; color: #166534; }}
    .status-reserved {{ background: #fef9c3; color: #854d0e; }}
    .status-adopted {{ background: #e2e8f0; color: #334155; }}
    .pagination span {{ padding: 0.3rem 0.7rem; }}
    .pagination .active {{ font-weight: 700; text-decoration: underline; }}
    .empty-state {{ text-align: center; padding: 3rem; color: #64748b; }}
  </style>
</head>
<body>
  <main>
{body}
  </main>
</body>
</html>
"####
    )
}

fn card(animal: &Animal) -> String {
    let status = animal.status();
    format!(
        r#"      <article class="card" data-id="{id}">
        <img src="{image}" alt="{name}" loading="lazy"/>
        <div class="info">
          <h3>{name}</h3>
          <p>{breed}</p>
          <p>{age} &middot; {gender} &middot; {location}</p>
          <span class="status {class}">{label}</span>
        </div>
      </article>
"#,
        id = escape_html(&animal.id),
        image = escape_html(&animal.image),
        name = escape_html(&animal.name),
        breed = escape_html(&animal.breed_label()),
        age = escape_html(&animal.age),
        gender = escape_html(&animal.gender),
        location = escape_html(&animal.location),
        class = status.css_class(),
        label = status.label(),
    )
}

pub fn render_listing(view: &PageView<'_>, stats: &ListingStats) -> String {
    let mut body = String::new();
    body.push_str("    <h1>Animals Looking for a Home</h1>\n");
    if view.is_empty() {
        body.push_str(&format!(
            "    <div class=\"empty-state\">{}</div>\n",
            escape_html(EMPTY_LISTING)
        ));
        return page("Adoptable Animals", &body);
    }
    body.push_str(&format!(
        "    <p class=\"stats\">{} animals: {} dogs, {} cats, {} others</p>\n",
        stats.total, stats.dogs, stats.cats, stats.others
    ));
    body.push_str("    <section class=\"grid\">\n");
    for animal in &view.items {
        body.push_str(&card(animal));
    }
    body.push_str("    </section>\n");
    if view.total_pages > 1 {
        body.push_str("    <nav class=\"pagination\">\n");
        for p in &view.buttons {
            let class = if *p == view.page { " class=\"active\"" } else { "" };
            body.push_str(&format!("      <span{class}>{p}</span>\n"));
        }
        body.push_str(&format!(
            "      <small>Page {} of {}</small>\n    </nav>\n",
            view.page, view.total_pages
        ));
    }
    page("Adoptable Animals", &body)
}

pub fn render_animal(animal: &Animal) -> String {
    let status = animal.status();
    let traits = animal
        .personality
        .iter()
        .map(|t| format!("<li>{}</li>", escape_html(t)))
        .collect::<String>();
    let body = format!(
        r#"    <article class="card detail">
      <img src="{image}" alt="{name}"/>
      <div class="info">
        <h1>{name}</h1>
        <span class="status {class}">{label}</span>
        <dl>
          <dt>Breed</dt><dd>{breed}</dd>
          <dt>Age</dt><dd>{age}</dd>
          <dt>Gender</dt><dd>{gender}</dd>
          <dt>Size</dt><dd>{size}</dd>
          <dt>Location</dt><dd>{location}</dd>
          <dt>Neutered</dt><dd>{neutered}</dd>
        </dl>
        <ul class="traits">{traits}</ul>
        <p class="story">{story}</p>
      </div>
    </article>
"#,
        image = escape_html(&animal.image),
        name = escape_html(&animal.name),
        class = status.css_class(),
        label = status.label(),
        breed = escape_html(&animal.breed_label()),
        age = escape_html(&animal.age),
        gender = escape_html(&animal.gender),
        size = escape_html(&capitalize(&animal.size)),
        location = escape_html(&animal.location),
        neutered = if animal.neutered { "Yes" } else { "No" },
        story = escape_html(animal.story.trim()),
    );
    page(&escape_html(&animal.name), &body)
}

pub fn render_donations(messages: &[DonationMessage]) -> String {
    let mut body = String::from("    <h1>Recent Donations</h1>\n");
    if messages.is_empty() {
        body.push_str(&format!(
            "    <div class=\"empty-state\">{}</div>\n",
            escape_html(EMPTY_DONATIONS)
        ));
        return page("Recent Donations", &body);
    }
    body.push_str("    <ul class=\"donations\">\n");
    for m in messages {
        body.push_str(&format!(
            "      <li><strong>{}</strong> donated {} <small>{}</small></li>\n",
            escape_html(&m.donor_name),
            format_amount(m.amount),
            escape_html(&m.donation_time)
        ));
    }
    body.push_str("    </ul>\n");
    page("Recent Donations", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::ListController;

    #[test]
    fn interpolated_values_are_escaped() {
        let animal = Animal {
            id: "1".into(),
            name: "<script>alert('x')</script>".into(),
            kind: "dog".into(),
            story: "Tom & Jerry".into(),
            ..Animal::default()
        }
        .normalized();
        let out = render_animal(&animal);
        assert!(!out.contains("<script>alert"));
        assert!(out.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
        assert!(out.contains("Tom &amp; Jerry"));
    }

    #[test]
    fn listing_marks_current_page() {
        let records = (1..=13)
            .map(|i| Animal {
                id: i.to_string(),
                name: format!("Pet{i}"),
                ..Animal::default()
            }
            .normalized())
            .collect();
        let mut list = ListController::new(records, 6).unwrap();
        list.set_page(2).unwrap();
        let out = render_listing(&list.view(), &list.stats());
        assert!(out.contains("<span class=\"active\">2</span>"));
        assert!(out.contains("Page 2 of 3"));
        assert_eq!(out.matches("<article class=\"card\"").count(), 6);
    }

    #[test]
    fn donor_names_are_escaped() {
        let out = render_donations(&[DonationMessage {
            donor_name: "<b>Ann</b>".into(),
            amount: 25.0,
            donation_time: "Just now".into(),
        }]);
        assert!(out.contains("&lt;b&gt;Ann&lt;/b&gt;"));
        assert!(out.contains("$25"));
    }
}
