/*!
# Sheetdash

Upload spreadsheets, browse the result folders produced for them, and render any
result file as a dashboard of per-column line charts.

## Architecture

### Storage Layer
- **ArtifactStore** - trait over two namespaces:
  - pending uploads, flat and keyed by filename
  - result folders named `Upload-<id>`, each a flat set of result files
- `FsArtifactStore` keeps both namespaces in directories; `MemoryArtifactStore`
  is the in-memory fake used in tests
- Result folders are written by an external producer, never by the store

### Visualization Layer
- **Title formatting** - raw column identifiers become chart labels
- **Dashboard builder** - one panel per numeric column, spacing and height scaled by panel count
- **Graph rendering** - dashboards drawn to SVG with plotters

### Transport Layer (`web` feature)
- axum router with multipart upload, listing, download and dashboard endpoints

## Modules

- **title**: column identifier to display title
- **dataset**: CSV loading and per-column type inference
- **dashboard**: panel selection and layout
- **graph**: SVG rendering
- **store**: artifact store trait and shared types
- **fs_store** / **memory_store**: store implementations
- **producer**: hook called after each upload
- **config**: server configuration
- **app**: routing and handlers

## REST API Endpoints

- `GET /` - Health check
- `POST /upload` - Store a spreadsheet (`.xlsx` / `.xls`) in the pending namespace
- `GET /processed` - Result folders, newest first
- `GET /processed/{folder_id}` - Files in one result folder
- `GET /download/{folder_id}/{filename}` - Raw result file
- `GET /dashboard/{folder_id}/{filename}` - Dashboard description as JSON
- `GET /visualize/{folder_id}/{filename}` - Dashboard rendered as SVG
*/

pub mod app;
pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod error;
pub mod fs_store;
pub mod graph;
pub mod memory_store;
pub mod producer;
pub mod store;
pub mod title;

pub use dashboard::{DashboardSpec, build_dashboard, load_dashboard};
pub use dataset::Dataset;
pub use error::{DashboardError, StoreError};
pub use fs_store::FsArtifactStore;
pub use graph::render_svg;
pub use memory_store::MemoryArtifactStore;
pub use store::ArtifactStore;
pub use title::format_title;
