use std::fs;
use std::io::{self, Write};
use std::path::Path;

use micro_ssve::SuperSimpleViewEngineWrapper;
use micro_view::{Model, RequestContext, ViewConfiguration, ViewFactory, ViewLocationContext, ViewSystem};
use serde::Serialize;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Serialize)]
struct HelloModel {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Languages")]
    languages: Vec<String>,
}

const MASTER: &str = r#"<html>
<head><link rel="stylesheet" href="~/site.css"/></head>
<body>@Section['Content'];</body>
</html>
"#;

const HELLO: &str = "@Master['master']
@Section['Content']
<h1>Hello @!Model.Name;</h1>
@If.HasLanguages;<ul>@Each.Languages;<li>@!Current;</li>@EndEach;</ul>@EndIf;
<form method=\"post\">@AntiForgeryToken;</form>
@EndSection
";

fn write_views(root: &Path) -> io::Result<()> {
    fs::create_dir_all(root.join("views"))?;
    fs::write(root.join("views/master.sshtml"), MASTER)?;
    fs::write(root.join("views/Hello.sshtml"), HELLO)
}

fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let root = match tempfile::tempdir() {
        Ok(root) => root,
        Err(e) => {
            error!(cause = %e, "failed to create view root");
            return;
        }
    };

    if let Err(e) = write_views(root.path()) {
        error!(cause = %e, "failed to write views");
        return;
    }

    let views = match ViewSystem::builder()
        .configuration(ViewConfiguration::new().with_view_root(root.path()).with_base_path("/demo"))
        .engine(SuperSimpleViewEngineWrapper::new())
        .build()
    {
        Ok(views) => views,
        Err(e) => {
            error!(cause = %e, "failed to build view system");
            return;
        }
    };

    let request = RequestContext::from_request(http::Request::new(()))
        .with_item(RequestContext::CSRF_TOKEN_KEY, "9f86d081884c7d65".to_string());
    let model = HelloModel { name: "<world>".into(), languages: vec!["rust".into(), "html".into()] };

    let writer = Model::from_serialize(&model)
        .and_then(|model| views.render_model(&model, &ViewLocationContext::new(&request)));
    match writer {
        Ok(writer) => {
            info!(view_cache = views.view_cache().len(), "rendered hello view");
            let mut stdout = io::stdout().lock();
            if let Err(e) = writer.write_to(&mut stdout).and_then(|()| stdout.flush()) {
                error!(cause = %e, "failed to write view");
            }
        }
        Err(e) => error!(cause = %e, "failed to render view"),
    }
}
