use dicomweb_lib::DicomWebClient;
use leptos::prelude::*;
use segview_core::dicom_json::StudySummary;
use segview_core::series::list_studies;
use wasm_bindgen_futures::spawn_local;

use crate::state::AppState;

#[derive(Clone, Debug, PartialEq)]
enum Listing {
    Loading,
    Loaded(Vec<StudySummary>),
    Failed(String),
}

/// Shown when the page was opened without `?study=`.
#[component]
pub fn StudyList() -> impl IntoView {
    let state = expect_context::<AppState>();
    let listing = RwSignal::new(Listing::Loading);

    let base_url = state.config.with_value(|c| c.metadata_base_url.clone());
    spawn_local(async move {
        let client = DicomWebClient::new(&base_url);
        let result = match list_studies(&client).await {
            Ok(studies) => Listing::Loaded(studies),
            Err(e) => {
                log::error!("Failed to list studies: {e}");
                Listing::Failed(e.to_string())
            }
        };
        listing.try_set(result);
    });

    view! {
        <div class="study-list">
            <h2>"Studies"</h2>
            {move || match listing.get() {
                Listing::Loading => view! { <div class="empty-state">"Loading studies…"</div> }.into_any(),
                Listing::Failed(message) => view! {
                    <div class="empty-state">{format!("Could not reach the study service: {message}")}</div>
                }.into_any(),
                Listing::Loaded(studies) if studies.is_empty() => {
                    view! { <div class="empty-state">"No studies uploaded yet"</div> }.into_any()
                }
                Listing::Loaded(studies) => view! {
                    <table>
                        <thead>
                            <tr><th>"Acquired"</th><th>"Modality"</th><th>"Patient"</th><th>"Description"</th></tr>
                        </thead>
                        <tbody>
                            {studies.into_iter().map(|s| {
                                let uid = s.study_uid.clone();
                                view! {
                                    <tr class="study-row" on:click=move |_| state.open_study(uid.clone())>
                                        <td>{s.acquired_label()}</td>
                                        <td>{s.modality.clone().unwrap_or_default()}</td>
                                        <td>{s.patient_id.clone().unwrap_or_default()}</td>
                                        <td>{s.description.clone().unwrap_or_default()}</td>
                                    </tr>
                                }
                            }).collect_view()}
                        </tbody>
                    </table>
                }.into_any(),
            }}
        </div>
    }
}
