//! HTML rendering of the dashboard.
//!
//! Pages are plain server-rendered HTML; every interaction is a form POST
//! followed by a redirect back to `/`. All scraped text is escaped.
use std::fmt::Write;

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::analysis::{ChartRow, SentimentReport};
use crate::harvest::{BucketHarvest, BucketStop};
use crate::model::Product;
use crate::session::{ReviewAnalysis, Session, View};

const TITLE: &str = "Product Reviews Analysis";
const GRID_COLUMNS: usize = 4;

const CHART_WIDTH: f64 = 520.0;
const CHART_HEIGHT: f64 = 260.0;
const CHART_MARGIN: f64 = 30.0;

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 2rem auto; max-width: 1100px; color: #222; }
button { background-color: #4CAF50; color: white; border: none; border-radius: 4px; padding: 8px 16px; font-size: 16px; margin: 4px 2px; cursor: pointer; }
button:hover { background-color: #45a049; }
button.secondary { background-color: #888; }
.notice { background: #fff3cd; border-radius: 4px; padding: 8px; }
.meta { color: #666; font-size: 14px; }
.meta.failed { color: #b00020; }
.grid { display: grid; grid-template-columns: repeat(4, 1fr); gap: 16px; }
.card img { width: 100%; }
.card figcaption { font-size: 14px; }
details { background-color: #f9f9f9; border-radius: 4px; padding: 8px; margin: 6px 0; }
summary { font-size: 18px; font-weight: bold; color: #4CAF50; cursor: pointer; }
"#;

/// Render the page for the session's current view.
pub fn page(session: &Session) -> String {
    let mut body = String::new();
    let _ = write!(body, "<h1>{TITLE}</h1>");
    search_form(&mut body, session);

    if let Some(notice) = session.notice() {
        let _ = write!(body, r#"<p class="notice">{}</p>"#, text(notice));
    }

    match session.view() {
        View::Start => {}
        View::Products => product_grid(&mut body, session),
        View::Reviews => {
            if let Some(product) = session.selected_product() {
                reviews(&mut body, product, session.current_analysis());
            }
        }
    }

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"utf-8\"><title>{TITLE}</title><style>{STYLE}</style></head><body>{body}</body></html>"
    )
}

fn search_form(out: &mut String, session: &Session) {
    let phrase = session.phrase().unwrap_or_default();
    let _ = write!(
        out,
        r#"<form method="post" action="/search"><label>Enter product search words: <input type="text" name="q" value="{}"></label> <button type="submit">Search Products</button></form>"#,
        attr(phrase)
    );

    if session.phrase().is_some() {
        let _ = write!(
            out,
            r#"<form method="post" action="/refresh"><input type="hidden" name="q" value="{}"><button type="submit" class="secondary">Refresh Results</button></form>"#,
            attr(phrase)
        );
    }

    if let Some(fetched_at) = session.fetched_at() {
        let _ = write!(
            out,
            r#"<p class="meta">Results fetched {}s ago</p>"#,
            fetched_at.elapsed().as_secs()
        );
    }
}

fn product_grid(out: &mut String, session: &Session) {
    out.push_str("<h2>Products Found:</h2>");
    let _ = write!(out, r#"<div class="grid" data-columns="{GRID_COLUMNS}">"#);
    for product in session.products().values() {
        let analysed = session
            .analysis_for(&product.id)
            .map(|a| a.harvest.total_reviews());
        product_card(out, product, analysed);
    }
    out.push_str("</div>");
}

fn product_card(out: &mut String, product: &Product, analysed: Option<usize>) {
    let _ = write!(
        out,
        concat!(
            r#"<div class="card"><figure><img src="{src}" alt="{alt}"><figcaption>{name}</figcaption></figure>"#,
            "<p><b>Price:</b> {price}</p><p><b>Rating:</b> {rating}</p><p><b>Votes:</b> {votes}</p>",
            r#"<form method="post" action="/products/{id}/reviews"><button type="submit">Fetch Reviews for {name}</button></form>"#,
        ),
        src = attr(&product.image_url),
        alt = attr(&product.name),
        name = text(&product.name),
        price = text(&product.price),
        rating = product.rating,
        votes = product.votes,
        id = attr(&product.id),
    );
    if let Some(count) = analysed {
        let _ = write!(out, r#"<p class="meta">{count} reviews analysed</p>"#);
    }
    out.push_str("</div>");
}

fn reviews(out: &mut String, product: &Product, analysis: Option<&ReviewAnalysis>) {
    let _ = write!(out, "<h2>Reviews for {}</h2>", text(&product.name));

    match analysis {
        Some(analysis) => {
            for bucket in &analysis.harvest.buckets {
                let _ = write!(
                    out,
                    "<details><summary>{} Reviews: ({}){}</summary>",
                    bucket.bucket.title(),
                    bucket.reviews.len(),
                    match bucket.stop {
                        BucketStop::Failed { .. } => " (incomplete)",
                        _ => "",
                    }
                );
                stop_note(out, bucket);
                for review in &bucket.reviews {
                    let _ = write!(out, "<p>{}</p>", text(review));
                }
                out.push_str("</details>");
            }
            out.push_str("<h2>Sentiment Scores:</h2>");
            out.push_str(&sentiment_chart(&analysis.report));
        }
        None => {
            let _ = write!(
                out,
                r#"<p>Reviews have not been fetched yet.</p><form method="post" action="/products/{}/reviews"><button type="submit">Fetch Reviews</button></form>"#,
                attr(&product.id)
            );
        }
    }

    out.push_str(
        r#"<form method="post" action="/back"><button type="submit" class="secondary">Go Back</button></form>"#,
    );
}

/// Why pagination of the bucket ended.
fn stop_note(out: &mut String, bucket: &BucketHarvest) {
    let _ = match &bucket.stop {
        BucketStop::PageLimit => write!(
            out,
            r#"<p class="meta">Showing the first {} pages</p>"#,
            bucket.pages_requested
        ),
        BucketStop::Exhausted { page: 1 } => {
            write!(out, r#"<p class="meta">No reviews found</p>"#)
        }
        BucketStop::Exhausted { page } => write!(
            out,
            r#"<p class="meta">No more reviews after page {}</p>"#,
            page - 1
        ),
        BucketStop::Failed { page, reason } => write!(
            out,
            r#"<p class="meta failed">Page {page} failed: {}</p>"#,
            text(reason)
        ),
    };
}

/// Bar chart of one score per star bucket, on a fixed [-1, 1] axis.
pub fn sentiment_chart(report: &SentimentReport) -> String {
    let rows = report.chart_rows();
    let plot_height = CHART_HEIGHT - 2.0 * CHART_MARGIN;
    let zero_y = CHART_MARGIN + plot_height / 2.0;
    let slot = (CHART_WIDTH - 2.0 * CHART_MARGIN) / rows.len().max(1) as f64;
    let bar_width = slot * 0.6;

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{CHART_WIDTH}" height="{CHART_HEIGHT}" role="img" aria-label="Sentiment Scores by Star Rating">"#
    );
    let _ = write!(
        svg,
        r#"<text x="{x}" y="16" text-anchor="middle" font-size="14">Sentiment Scores by Star Rating</text>"#,
        x = CHART_WIDTH / 2.0
    );

    for (i, row) in rows.iter().enumerate() {
        let x = CHART_MARGIN + slot * i as f64 + (slot - bar_width) / 2.0;
        let score = row.score.clamp(-1.0, 1.0);
        let height = score.abs() * plot_height / 2.0;
        let y = if score >= 0.0 { zero_y - height } else { zero_y };
        let _ = write!(
            svg,
            r#"<rect class="bar" data-star="{star}" data-score="{score:.4}" x="{x:.1}" y="{y:.1}" width="{bar_width:.1}" height="{height:.1}" fill="{fill}"><title>{star}: {score:.3}</title></rect>"#,
            star = text(&row.star),
            fill = bar_color(score),
        );
        bar_label(&mut svg, row, x + bar_width / 2.0);
    }

    let _ = write!(
        svg,
        r##"<line x1="{CHART_MARGIN}" y1="{zero_y}" x2="{x2}" y2="{zero_y}" stroke="#333"/>"##,
        x2 = CHART_WIDTH - CHART_MARGIN
    );
    svg.push_str("</svg>");
    svg
}

fn bar_label(svg: &mut String, row: &ChartRow, center: f64) {
    let label_y = CHART_HEIGHT - CHART_MARGIN / 3.0;
    let _ = write!(
        svg,
        r#"<text x="{center:.1}" y="{label_y:.1}" text-anchor="middle" font-size="12">{}</text>"#,
        text(&row.star)
    );
    if !row.has_data {
        let _ = write!(
            svg,
            r##"<text class="no-data" x="{center:.1}" y="{y:.1}" text-anchor="middle" font-size="11" fill="#888">no data</text>"##,
            y = CHART_MARGIN + (CHART_HEIGHT - 2.0 * CHART_MARGIN) / 2.0 - 4.0
        );
    }
}

/// Blue at -1 through red at +1.
fn bar_color(score: f64) -> String {
    let t = (score.clamp(-1.0, 1.0) + 1.0) / 2.0;
    let red = (255.0 * t).round() as u8;
    let blue = (255.0 * (1.0 - t)).round() as u8;
    format!("#{red:02x}00{blue:02x}")
}
