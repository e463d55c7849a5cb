//! HTML rendering for the task list page.
//!
//! The page skeleton lives in `templates/index.html` and is embedded at compile time.
//! Rendering substitutes `{{SUMMARY}}` and `{{TASKS}}`.

use crate::core::Task;

const INDEX_TEMPLATE: &str = include_str!("templates/index.html");

pub fn render_index(tasks: &[Task]) -> String {
    let done = tasks.iter().filter(|t| t.completed).count();
    let summary = format!("{done} of {} completed", tasks.len());

    let list = if tasks.is_empty() {
        r#"<p class="empty">No tasks yet</p>"#.to_string()
    } else {
        let items: String = tasks.iter().map(render_task).collect();
        format!("<ul>\n{items}    </ul>")
    };

    INDEX_TEMPLATE
        .replace("{{SUMMARY}}", &summary)
        .replace("{{TASKS}}", &list)
}

fn render_task(task: &Task) -> String {
    let (class, marker) = if task.completed {
        ("completed", "&#10003;")
    } else {
        ("pending", "&#9744;")
    };
    let complete_link = if task.completed {
        String::new()
    } else {
        format!(r#"<a href="/complete/{}">Complete</a>"#, task.id)
    };
    format!(
        concat!(
            "        <li class=\"{class}\" id=\"task-{id}\">",
            "<span class=\"marker\">{marker}</span>",
            "<span class=\"description\">{description}</span>",
            "{complete}",
            "<a href=\"/delete/{id}\">Delete</a>",
            "</li>\n",
        ),
        class = class,
        id = task.id,
        marker = marker,
        description = html_escape(&task.description),
        complete = complete_link,
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
