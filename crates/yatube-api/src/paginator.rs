use yatube_db::{PostFilter, Repository};
use yatube_types::api::Page;
use yatube_types::models::Post;

/// Splits `count` ordered items into pages of `per_page`.
///
/// Pages are 1-indexed. An empty collection still has one (empty) page, and
/// out-of-range requests clamp to the first or last page.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    count: usize,
    per_page: usize,
}

impl Paginator {
    pub fn new(count: usize, per_page: usize) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    pub fn num_pages(&self) -> usize {
        self.count.div_ceil(self.per_page).max(1)
    }

    /// Turns the raw `?page=` value into a valid page number.
    ///
    /// Missing or non-numeric → 1; below 1 → 1; past the end → last page.
    /// A leading `+` is accepted.
    pub fn resolve(&self, raw: Option<&str>) -> usize {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return 1;
        };
        let last = self.num_pages();

        // An explicit `+` is allowed; negative numbers clamp low, same as garbage
        let digits = raw.strip_prefix('+').unwrap_or(raw);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return 1;
        }
        // All digits but too long for u64: certainly past the end
        let n = digits.parse::<u64>().unwrap_or(u64::MAX);
        if n < 1 {
            1
        } else if n > last as u64 {
            last
        } else {
            n as usize
        }
    }

    /// `(offset, limit)` of page `number`, which must already be resolved.
    pub fn window(&self, number: usize) -> (usize, usize) {
        ((number - 1) * self.per_page, self.per_page)
    }

    pub fn page<T>(&self, number: usize, items: Vec<T>) -> Page<T> {
        let num_pages = self.num_pages();
        Page {
            items,
            number,
            num_pages,
            count: self.count,
            per_page: self.per_page,
            has_next: number < num_pages,
            has_previous: number > 1,
        }
    }
}

/// Count, resolve and fetch one page of posts under `filter`.
pub fn paginate_posts(
    repo: &dyn Repository,
    filter: PostFilter,
    per_page: usize,
    raw_page: Option<&str>,
) -> anyhow::Result<Page<Post>> {
    let paginator = Paginator::new(repo.count_posts(filter)?, per_page);
    let number = paginator.resolve(raw_page);
    let (offset, limit) = paginator.window(number);
    let items = repo.list_posts(filter, limit, offset)?;
    Ok(paginator.page(number, items))
}
