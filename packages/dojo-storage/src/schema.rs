pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		match line.trim().strip_prefix("\\ir ").map(str::trim) {
			Some("tables/001_dojos.sql") =>
				out.push_str(include_str!("../../../sql/tables/001_dojos.sql")),
			Some("tables/002_place_cache.sql") =>
				out.push_str(include_str!("../../../sql/tables/002_place_cache.sql")),
			Some("tables/003_billing_customers.sql") =>
				out.push_str(include_str!("../../../sql/tables/003_billing_customers.sql")),
			Some("tables/004_subscriptions.sql") =>
				out.push_str(include_str!("../../../sql/tables/004_subscriptions.sql")),
			_ => out.push_str(line),
		}

		out.push('\n');
	}

	out
}
