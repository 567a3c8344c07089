//! Blog document invariants checked before anything is persisted.

use slug::slugify;
use solstate_api_types::{BlogDocument, BlogStatus, ContentBlock};
use time::OffsetDateTime;

use super::datasets::DatasetId;
use super::error::DomainError;

const MAX_HEADING_LEVEL: u8 = 6;

/// Validate a document and fill in its derived fields (slug, timestamps).
pub fn prepare_document(
    mut document: BlogDocument,
    now: OffsetDateTime,
) -> Result<BlogDocument, DomainError> {
    let post = &mut document.blog_post;

    post.title = post.title.trim().to_string();
    if post.title.is_empty() {
        return Err(DomainError::validation("title", "is required"));
    }

    let slug_source = if post.slug.trim().is_empty() {
        post.title.as_str()
    } else {
        post.slug.as_str()
    };
    post.slug = canonical_slug(slug_source)?;

    if post.status == BlogStatus::Published {
        if post.author.trim().is_empty() {
            return Err(DomainError::validation(
                "author",
                "is required before publishing",
            ));
        }
        if post.excerpt.trim().is_empty() {
            return Err(DomainError::validation(
                "excerpt",
                "is required before publishing",
            ));
        }
        if document.content.is_empty() {
            return Err(DomainError::validation(
                "content",
                "a published post needs at least one block",
            ));
        }
    }

    for (index, block) in document.content.iter().enumerate() {
        validate_block(block).map_err(|reason| {
            DomainError::validation(
                "content",
                format!("block {index} ({}): {reason}", block.kind()),
            )
        })?;
    }

    let post = &mut document.blog_post;
    post.created_at = post.created_at.or(Some(now));
    post.updated_at = Some(now);

    Ok(document)
}

/// Reduce arbitrary text to the slug used as the storage key.
pub fn canonical_slug(raw: &str) -> Result<String, DomainError> {
    let slug = slugify(raw.trim());
    if slug.is_empty() {
        return Err(DomainError::validation(
            "slug",
            format!("`{raw}` does not produce a usable slug"),
        ));
    }
    Ok(slug)
}

fn validate_block(block: &ContentBlock) -> Result<(), String> {
    match block {
        ContentBlock::Paragraph { text } | ContentBlock::Quote { text, .. } => {
            non_blank(text, "text")
        }
        ContentBlock::Heading { level, text } => {
            if !(1..=MAX_HEADING_LEVEL).contains(level) {
                return Err(format!(
                    "level must be between 1 and {MAX_HEADING_LEVEL}, got {level}"
                ));
            }
            non_blank(text, "text")
        }
        ContentBlock::List { items, .. } => {
            if items.is_empty() {
                return Err("list has no items".to_string());
            }
            items.iter().try_for_each(|item| non_blank(item, "item"))
        }
        ContentBlock::Image { url, .. } => non_blank(url, "url"),
        ContentBlock::Divider => Ok(()),
        ContentBlock::Chart { chart_id, .. } => chart_id
            .parse::<DatasetId>()
            .map(|_| ())
            .map_err(|_| format!("unknown chart `{chart_id}`")),
    }
}

fn non_blank(value: &str, what: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{what} must not be empty"))
    } else {
        Ok(())
    }
}
