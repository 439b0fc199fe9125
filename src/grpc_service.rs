use crate::errors::{ServiceError, ServiceResult, SensorError};
use crate::sensors::SubdevDriver;
use crate::v4l2::{self, BufType, Colorspace, Field, Fract, FrameIntervalQuery, MbusFrameFmt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tonic::{Request, Response, Status};
use tracing::{debug, info, warn};

// Include the generated protobuf code
pub mod subdev {
    tonic::include_proto!("subdev");
}

use subdev as pb;
use subdev::video_subdev_server::{VideoSubdev, VideoSubdevServer};

type SharedSubdev = Arc<Mutex<Box<dyn SubdevDriver>>>;

/// Host side of the subdevice registration: keeps every probed camera and
/// serves its operations to the capture pipeline
#[derive(Clone, Default)]
pub struct SubdevService {
    subdevs: Arc<RwLock<HashMap<String, SharedSubdev>>>,
}

impl SubdevService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, driver: Box<dyn SubdevDriver>) -> ServiceResult<()> {
        let id = driver.id().to_string();
        let mut subdevs = self.subdevs.write().await;
        if subdevs.contains_key(&id) {
            return Err(ServiceError::AlreadyRegistered { id });
        }
        info!("[gRPC] registered subdevice {} ({} on {})", id, driver.driver(), driver.bus());
        subdevs.insert(id, Arc::new(Mutex::new(driver)));
        Ok(())
    }

    /// Drop a subdevice and power its sensor down
    pub async fn unregister(&self, id: &str) -> ServiceResult<()> {
        let subdev = self
            .subdevs
            .write()
            .await
            .remove(id)
            .ok_or_else(|| ServiceError::SubdevNotFound { id: id.to_string() })?;

        let mut driver = subdev.lock().await;
        if let Err(e) = driver.remove().await {
            warn!("[gRPC] {} did not power down cleanly: {}", id, e);
        }
        info!("[gRPC] unregistered subdevice {}", id);
        Ok(())
    }

    /// Unregister everything, powering each sensor down
    pub async fn shutdown(&self) {
        for id in self.ids().await {
            if let Err(e) = self.unregister(&id).await {
                warn!("[gRPC] {}", e);
            }
        }
    }

    pub async fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.subdevs.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    async fn lookup(&self, id: &str) -> Result<SharedSubdev, ServiceError> {
        if id.is_empty() {
            return Err(ServiceError::InvalidRequest { reason: "subdev_id is empty".to_string() });
        }
        self.subdevs
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::SubdevNotFound { id: id.to_string() })
    }
}

fn info_of(driver: &dyn SubdevDriver) -> pb::SubdevInfo {
    pb::SubdevInfo {
        id: driver.id().to_string(),
        driver: driver.driver().to_string(),
        bus: driver.bus().to_string(),
        powered: driver.is_powered(),
    }
}

fn fraction(f: Fract) -> pb::Fraction {
    pb::Fraction { numerator: f.numerator, denominator: f.denominator }
}

fn stream_parm_to_pb(subdev_id: String, parm: v4l2::StreamParm) -> pb::StreamParm {
    pb::StreamParm {
        subdev_id,
        buf_type: parm.buf_type as u32,
        capability: parm.capture.capability,
        capture_mode: parm.capture.capture_mode,
        time_per_frame: Some(fraction(parm.capture.time_per_frame)),
    }
}

fn stream_parm_from_pb(req: &pb::StreamParm) -> Result<v4l2::StreamParm, SensorError> {
    let tpf = req.time_per_frame.clone().unwrap_or_default();
    Ok(v4l2::StreamParm {
        buf_type: BufType::try_from(req.buf_type)?,
        capture: v4l2::CaptureParm {
            capability: req.capability,
            capture_mode: req.capture_mode,
            time_per_frame: Fract::new(tpf.numerator, tpf.denominator),
        },
    })
}

fn frame_fmt_to_pb(subdev_id: String, fmt: MbusFrameFmt) -> pb::FrameFormat {
    pb::FrameFormat {
        subdev_id,
        width: fmt.width,
        height: fmt.height,
        code: fmt.code,
        field: fmt.field as u32,
        colorspace: fmt.colorspace as u32,
    }
}

fn frame_fmt_from_pb(req: &pb::FrameFormat) -> Result<MbusFrameFmt, SensorError> {
    Ok(MbusFrameFmt {
        width: req.width,
        height: req.height,
        code: req.code,
        field: Field::try_from(req.field)?,
        colorspace: Colorspace::try_from(req.colorspace)?,
    })
}

#[tonic::async_trait]
impl VideoSubdev for SubdevService {
    async fn list_subdevs(&self, _request: Request<pb::ListRequest>) -> Result<Response<pb::SubdevList>, Status> {
        let mut subdevs = Vec::new();
        for id in self.ids().await {
            let subdev = self.lookup(&id).await?;
            let driver = subdev.lock().await;
            subdevs.push(info_of(&**driver));
        }
        Ok(Response::new(pb::SubdevList { subdevs }))
    }

    async fn get_status(&self, request: Request<pb::SubdevRequest>) -> Result<Response<pb::SubdevStatus>, Status> {
        let req = request.into_inner();
        let subdev = self.lookup(&req.subdev_id).await?;
        let driver = subdev.lock().await;
        let status = driver.status();

        Ok(Response::new(pb::SubdevStatus {
            info: Some(info_of(&**driver)),
            address: status.address as u32,
            chip_id: status.chip_id.map(u32::from),
            output_format_reg: status.output_format_reg.map(u32::from),
            mclk_hz: status.mclk_hz,
            mclk_source: status.mclk_source as u32,
            csi_id: status.csi_id,
            frame_rate: status.frame_rate,
            tuning: status.tuning.to_string(),
        }))
    }

    async fn set_power(&self, request: Request<pb::PowerRequest>) -> Result<Response<pb::PowerReply>, Status> {
        let req = request.into_inner();
        let subdev = self.lookup(&req.subdev_id).await?;
        let mut driver = subdev.lock().await;

        driver.s_power(req.on)?;
        debug!("[gRPC] {} power {}", req.subdev_id, if req.on { "on" } else { "off" });
        Ok(Response::new(pb::PowerReply { on: driver.is_powered() }))
    }

    async fn get_parm(&self, request: Request<pb::ParmRequest>) -> Result<Response<pb::StreamParm>, Status> {
        let req = request.into_inner();
        let subdev = self.lookup(&req.subdev_id).await?;
        let driver = subdev.lock().await;

        let parm = driver.g_parm(BufType::try_from(req.buf_type)?)?;
        Ok(Response::new(stream_parm_to_pb(req.subdev_id, parm)))
    }

    async fn set_parm(&self, request: Request<pb::StreamParm>) -> Result<Response<pb::StreamParm>, Status> {
        let req = request.into_inner();
        let subdev = self.lookup(&req.subdev_id).await?;
        let mut driver = subdev.lock().await;

        let parm = driver.s_parm(stream_parm_from_pb(&req)?)?;
        Ok(Response::new(stream_parm_to_pb(req.subdev_id, parm)))
    }

    async fn try_format(&self, request: Request<pb::FrameFormat>) -> Result<Response<pb::FrameFormat>, Status> {
        let req = request.into_inner();
        let subdev = self.lookup(&req.subdev_id).await?;
        let driver = subdev.lock().await;

        let fmt = driver.try_fmt(frame_fmt_from_pb(&req)?);
        Ok(Response::new(frame_fmt_to_pb(req.subdev_id, fmt)))
    }

    async fn set_format(&self, request: Request<pb::FrameFormat>) -> Result<Response<pb::FrameFormat>, Status> {
        let req = request.into_inner();
        let subdev = self.lookup(&req.subdev_id).await?;
        let mut driver = subdev.lock().await;

        let fmt = driver.s_fmt(frame_fmt_from_pb(&req)?)?;
        Ok(Response::new(frame_fmt_to_pb(req.subdev_id, fmt)))
    }

    async fn get_format(&self, request: Request<pb::SubdevRequest>) -> Result<Response<pb::FrameFormat>, Status> {
        let req = request.into_inner();
        let subdev = self.lookup(&req.subdev_id).await?;
        let driver = subdev.lock().await;

        Ok(Response::new(frame_fmt_to_pb(req.subdev_id, driver.g_fmt())))
    }

    async fn enum_format(&self, request: Request<pb::IndexRequest>) -> Result<Response<pb::PixelCode>, Status> {
        let req = request.into_inner();
        let subdev = self.lookup(&req.subdev_id).await?;
        let driver = subdev.lock().await;

        let code = driver.enum_fmt(req.index)?;
        Ok(Response::new(pb::PixelCode { code }))
    }

    async fn enum_frame_sizes(&self, request: Request<pb::IndexRequest>) -> Result<Response<pb::FrameSize>, Status> {
        let req = request.into_inner();
        let subdev = self.lookup(&req.subdev_id).await?;
        let driver = subdev.lock().await;

        let size = driver.enum_framesizes(req.index)?;
        Ok(Response::new(pb::FrameSize { width: size.width, height: size.height }))
    }

    async fn enum_frame_intervals(
        &self,
        request: Request<pb::FrameIntervalRequest>,
    ) -> Result<Response<pb::FrameInterval>, Status> {
        let req = request.into_inner();
        let subdev = self.lookup(&req.subdev_id).await?;
        let driver = subdev.lock().await;

        let interval = driver.enum_frameintervals(&FrameIntervalQuery {
            index: req.index,
            width: req.width,
            height: req.height,
            pixel_format: req.pixel_format,
        })?;
        Ok(Response::new(pb::FrameInterval { interval: Some(fraction(interval)) }))
    }
}

/// Create gRPC server with the service
pub fn create_grpc_server(service: SubdevService) -> VideoSubdevServer<SubdevService> {
    VideoSubdevServer::new(service)
}

#[cfg(all(test, feature = "gc0308"))]
mod tests {
    use super::*;
    use crate::sensors::gc0308::tests::{entry, sensor_with};
    use crate::v4l2::{MEDIA_BUS_FMT_YUYV8_2X8, V4L2_PIX_FMT_YUYV};
    use tonic::Code;

    async fn service() -> SubdevService {
        let service = SubdevService::new();
        let (sensor, _log) = sensor_with(&entry());
        service.register(Box::new(sensor)).await.unwrap();
        service
    }

    fn parm_request(buf_type: u32) -> Request<pb::ParmRequest> {
        Request::new(pb::ParmRequest { subdev_id: "cam0".to_string(), buf_type })
    }

    #[tokio::test]
    async fn lists_registered_subdevs() {
        let service = service().await;

        let list = service.list_subdevs(Request::new(pb::ListRequest {})).await.unwrap().into_inner();
        assert_eq!(list.subdevs.len(), 1);
        assert_eq!(list.subdevs[0].id, "cam0");
        assert_eq!(list.subdevs[0].driver, "gc0308");
        assert_eq!(list.subdevs[0].bus, "i2c1");
        assert!(!list.subdevs[0].powered);
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let service = service().await;
        let (again, _log) = sensor_with(&entry());

        let err = service.register(Box::new(again)).await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyRegistered { .. }));
        assert_eq!(Status::from(err).code(), Code::AlreadyExists);
    }

    #[tokio::test]
    async fn unknown_subdev_is_not_found() {
        let service = service().await;
        let req = Request::new(pb::SubdevRequest { subdev_id: "cam9".to_string() });

        let status = service.get_format(req).await.unwrap_err();
        assert_eq!(status.code(), Code::NotFound);

        let req = Request::new(pb::SubdevRequest { subdev_id: String::new() });
        let status = service.get_format(req).await.unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn get_parm_checks_buffer_type() {
        let service = service().await;

        let parm = service.get_parm(parm_request(1)).await.unwrap().into_inner();
        assert_eq!(parm.time_per_frame, Some(pb::Fraction { numerator: 1, denominator: 30 }));
        assert_eq!(parm.capability, 0x1001);

        let status = service.get_parm(parm_request(2)).await.unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);

        let status = service.get_parm(parm_request(42)).await.unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn set_parm_round_trips_through_status() {
        let service = service().await;
        let req = pb::StreamParm {
            subdev_id: "cam0".to_string(),
            buf_type: 1,
            capability: 0,
            capture_mode: 0,
            time_per_frame: Some(pb::Fraction { numerator: 1, denominator: 10 }),
        };

        let applied = service.set_parm(Request::new(req.clone())).await.unwrap().into_inner();
        assert_eq!(applied.time_per_frame, Some(pb::Fraction { numerator: 1, denominator: 15 }));
        assert_eq!(applied.capability, 0);

        let status = service
            .get_status(Request::new(pb::SubdevRequest { subdev_id: "cam0".to_string() }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(status.frame_rate, 15);
        assert_eq!(status.address, 0x21);
        assert_eq!(status.tuning, "default");
        assert_eq!(status.chip_id, None);

        let unsupported = pb::StreamParm {
            time_per_frame: Some(pb::Fraction { numerator: 1, denominator: 20 }),
            ..req
        };
        let status = service.set_parm(Request::new(unsupported)).await.unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn format_negotiation() {
        let service = service().await;
        let request = pb::FrameFormat {
            subdev_id: "cam0".to_string(),
            width: 320,
            height: 240,
            code: 0x3001,
            field: 0,
            colorspace: 8,
        };

        let tried = service.try_format(Request::new(request.clone())).await.unwrap().into_inner();
        assert_eq!(tried.code, MEDIA_BUS_FMT_YUYV8_2X8);
        assert_eq!(tried.colorspace, Colorspace::Jpeg as u32);
        assert_eq!(tried.field, Field::None as u32);
        assert_eq!((tried.width, tried.height), (640, 480));

        let status = service.set_format(Request::new(request.clone())).await.unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);

        let bad_field = pb::FrameFormat { field: 99, ..request };
        let status = service.try_format(Request::new(bad_field)).await.unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn enumerations() {
        let service = service().await;
        let index = |index| Request::new(pb::IndexRequest { subdev_id: "cam0".to_string(), index });

        let code = service.enum_format(index(0)).await.unwrap().into_inner();
        assert_eq!(code.code, MEDIA_BUS_FMT_YUYV8_2X8);

        let size = service.enum_frame_sizes(index(0)).await.unwrap().into_inner();
        assert_eq!((size.width, size.height), (640, 480));
        assert_eq!(service.enum_frame_sizes(index(1)).await.unwrap_err().code(), Code::InvalidArgument);

        let interval = service
            .enum_frame_intervals(Request::new(pb::FrameIntervalRequest {
                subdev_id: "cam0".to_string(),
                index: 1,
                width: 640,
                height: 480,
                pixel_format: V4L2_PIX_FMT_YUYV,
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(interval.interval, Some(pb::Fraction { numerator: 1, denominator: 30 }));
    }

    #[tokio::test]
    async fn set_power_is_reported() {
        let service = service().await;

        let reply = service
            .set_power(Request::new(pb::PowerRequest { subdev_id: "cam0".to_string(), on: true }))
            .await
            .unwrap()
            .into_inner();
        assert!(reply.on);

        let list = service.list_subdevs(Request::new(pb::ListRequest {})).await.unwrap().into_inner();
        assert!(list.subdevs[0].powered);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_unregisters_everything() {
        let service = service().await;
        service
            .set_power(Request::new(pb::PowerRequest { subdev_id: "cam0".to_string(), on: true }))
            .await
            .unwrap();

        service.shutdown().await;

        assert!(service.ids().await.is_empty());
        let err = service.unregister("cam0").await.unwrap_err();
        assert!(matches!(err, ServiceError::SubdevNotFound { .. }));
    }
}
